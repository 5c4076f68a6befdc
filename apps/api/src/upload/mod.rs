// Resume upload: page state, the analysis pipeline, and its HTTP surface.

pub mod form;
pub mod handlers;
pub mod page;
pub mod pipeline;
