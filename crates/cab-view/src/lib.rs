pub mod input;
pub mod view;

pub use input::{InputEvent, Modifiers};
pub use view::{ClickBehavior, TreeView, ViewConfig, ViewEvent};
