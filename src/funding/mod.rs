pub mod adjustment;
pub mod deposit;
pub mod p2p;
pub mod provider;
pub mod types;
pub mod withdraw;

pub use adjustment::AdjustmentService;
pub use deposit::DepositService;
pub use p2p::P2pService;
pub use provider::{MockPaymentProvider, PaymentProvider};
pub use withdraw::WithdrawService;
