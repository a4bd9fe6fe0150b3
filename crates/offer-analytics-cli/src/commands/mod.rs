pub mod offers;
pub mod payment;
