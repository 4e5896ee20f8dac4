//! External collaborators.

pub mod store {
    pub use crate::store::*;
}

pub mod scoring {
    pub use crate::scoring::*;
}
