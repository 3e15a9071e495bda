pub mod fab;
pub mod navigation;
pub mod page;
pub mod templates;

pub use fab::FabComponent;
pub use navigation::NavigationComponent;
pub use page::PageRenderer;
pub use templates::TemplateComponent;
