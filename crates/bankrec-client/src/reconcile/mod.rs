pub mod export;
pub mod manual;
pub mod matcher;
pub mod scoring;
pub mod suggest;

pub const CATEGORY_AUTO: &str = "auto";
pub const CATEGORY_MANUAL: &str = "manual";

/// Voucher type a bank line of `direction` can settle.
pub(crate) fn voucher_type_for(direction: &str) -> Option<&'static str> {
    match direction {
        "credit" => Some("sale"),
        "debit" => Some("purchase"),
        _ => None,
    }
}
