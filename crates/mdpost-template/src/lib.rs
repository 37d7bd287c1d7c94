//! Template application for rendered articles.
//!
//! A [`TemplateEngine`] wraps final article HTML in a named handlebars
//! template. Templates come from a [`TemplateSource`]: a directory of
//! `*.html`/`*.hbs` files or an in-memory map. A missing template is not an
//! error; the content is returned unwrapped.

mod engine;
mod source;

pub use engine::{CONTENT_KEY, EPIGRAPH_KEY, EPIGRAPH_PLACEHOLDER, TemplateEngine};
pub use source::{DirTemplateSource, MemoryTemplateSource, TemplateSource};

/// Template loading and rendering failure.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template source could not be read.
    #[error("failed to read templates: {0}")]
    Io(#[from] std::io::Error),
    /// Template text failed to compile.
    #[error("template '{name}' failed to compile: {message}")]
    Compile { name: String, message: String },
    /// Compiled template failed to render.
    #[error("template '{name}' failed to render: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}
