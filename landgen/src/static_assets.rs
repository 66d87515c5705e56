//! Files compiled into the binary: the page template and the assets it links to.

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "templates/"]
pub struct Templates;

#[derive(RustEmbed)]
#[folder = "static/"]
pub struct Assets;
