//! Default pipeline stages.
//!
//! The standard document processing pipeline consists of:
//!
//! 1. **TemplateEngineStage** - Process Tera syntax in content files
//! 2. **MarkdownStage** - Convert markdown to HTML
//! 3. **LayoutStage** - Wrap content in its layout template
//! 4. **WriteStage** - Write final HTML to output directory

mod layout;
mod markdown;
mod tera;
mod write;

pub use layout::LayoutStage;
pub use markdown::MarkdownStage;
pub use tera::TemplateEngineStage;
pub use write::WriteStage;
