pub mod live;
pub mod mock;
pub mod provider;

pub use live::LiveChainProvider;
pub use mock::MockChainProvider;
pub use provider::{ChainProvider, ProviderKind};
