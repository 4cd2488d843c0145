pub mod constants;
pub mod dispatcher;
pub mod method;
