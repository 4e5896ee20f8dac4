// Validation and dispatch core plus shared errors/models
pub mod fields {
    pub use crate::fields::*;
}

pub mod schema {
    pub use crate::schema::*;
}

pub mod requests {
    pub use crate::requests::*;
}

pub mod auth {
    pub use crate::auth::*;
}

pub mod dispatcher {
    pub use crate::dispatcher::*;
}

pub mod errors {
    pub use crate::errors::*;
}

pub mod models {
    pub use crate::models::*;
}
