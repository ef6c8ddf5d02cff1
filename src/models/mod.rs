mod article;
mod learner;
mod quiz;
mod vocabulary;

pub use article::*;
pub use learner::*;
pub use quiz::*;
pub use vocabulary::*;
