pub mod factory;
pub mod opportunity;
pub mod pool;
pub mod token;

pub use factory::FactoryRepository;
pub use opportunity::OpportunityRepository;
pub use pool::PoolRepository;
pub use token::TokenRepository;
