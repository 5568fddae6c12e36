pub mod logging_gateway;
pub mod openai_oracle;
pub mod whatsapp_gateway;

pub use logging_gateway::*;
pub use openai_oracle::*;
pub use whatsapp_gateway::*;
