pub mod event_bus;
pub mod lead_repository;
pub mod message_repository;
pub mod messaging_gateway;
pub mod nlu_oracle;
pub mod professional_repository;
pub mod slot_repository;
pub mod system_config_repository;
pub mod time_service;
