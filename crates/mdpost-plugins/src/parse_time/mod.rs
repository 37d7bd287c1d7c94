//! Plugins that shape token rendering inside the parser.

mod card;
mod footnote;
mod heading;
mod math;
mod wiki_image;

pub use card::CardPlugin;
pub use footnote::FootnotePlugin;
pub use heading::HeadingPlugin;
pub use math::MathPlugin;
pub use wiki_image::WikiImagePlugin;
