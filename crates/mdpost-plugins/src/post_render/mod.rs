//! Transforms over the complete rendered HTML.

mod card_restore;
mod code_highlight;
mod image_caption;
mod inline_style;
mod table_wrap;
mod theme;

pub use card_restore::CardRestorePlugin;
pub use code_highlight::CodeHighlightPlugin;
pub use image_caption::ImageCaptionPlugin;
pub use inline_style::InlineStylePlugin;
pub use table_wrap::TableWrapPlugin;
