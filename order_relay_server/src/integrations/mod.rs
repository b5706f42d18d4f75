pub mod telegram;
pub mod yookassa;
