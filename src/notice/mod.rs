pub mod dispatcher;
pub mod request;
