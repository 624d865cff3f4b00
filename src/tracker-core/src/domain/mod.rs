mod data_message;
mod live_status;
mod position;
mod record;
mod route;
mod vessel;

pub use data_message::*;
pub use live_status::*;
pub use position::*;
pub use record::*;
pub use route::*;
pub use vessel::*;
