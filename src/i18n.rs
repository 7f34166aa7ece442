use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ro,
}

/// Header label for `key`, or `key` itself when it has no translation.
pub fn translate(key: &str, language: Language) -> &str {
    let label = match (key, language) {
        ("data", Language::En) => "Date",
        ("data", Language::Ro) => "Data",
        ("details", Language::En) => "Details",
        ("details", Language::Ro) => "Detalii",
        ("rate_nr", Language::En) => "Installment",
        ("rate_nr", Language::Ro) => "Rata",
        ("num_rates", Language::En) => "Installments",
        ("num_rates", Language::Ro) => "Nr. rate",
        ("store", Language::En) => "Store",
        ("store", Language::Ro) => "Magazin",
        ("category", Language::En) => "Category",
        ("category", Language::Ro) => "Categorie",
        ("transaction_nr", Language::En) => "Transaction no",
        ("transaction_nr", Language::Ro) => "Nr tranzactie",
        ("total_transaction", Language::En) => "Transaction total",
        ("total_transaction", Language::Ro) => "Total tranzactie",
        ("amount_to_return", Language::En) => "Amount",
        ("amount_to_return", Language::Ro) => "Suma",
        ("pattern", Language::En) => "Pattern",
        ("pattern", Language::Ro) => "Sablon",
        ("over_x_months", Language::En) => "Ending in (months)",
        ("over_x_months", Language::Ro) => "Se termina in (luni)",
        ("sum", Language::En) => "Sum",
        ("sum", Language::Ro) => "Suma",
        ("expenses", Language::En) => "Expenses",
        ("expenses", Language::Ro) => "Cheltuieli",
        _ => return key,
    };
    label
}
