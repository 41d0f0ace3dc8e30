// Test-only customer records shared by the unit tests of several layers.

use serde_json::{json, Value};

use crate::domain::record::{FieldValue, RawRecord};

pub(crate) const CSV_HEADER: &str = "customerID,gender,SeniorCitizen,Partner,Dependents,tenure,\
PhoneService,MultipleLines,InternetService,OnlineSecurity,OnlineBackup,DeviceProtection,\
TechSupport,StreamingTV,StreamingMovies,Contract,PaperlessBilling,PaymentMethod,\
MonthlyCharges,TotalCharges,Churn";

const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];
const PAYMENTS: [&str; 4] = [
    "Electronic check",
    "Mailed check",
    "Bank transfer (automatic)",
    "Credit card (automatic)",
];
const INTERNET: [&str; 3] = ["DSL", "Fiber optic", "No"];

/// A complete 19-field record with the remaining categoricals fixed.
pub(crate) fn customer(tenure: f64, monthly: f64, total: f64, contract: &str, payment: &str) -> RawRecord {
    RawRecord::new()
        .with("tenure", tenure)
        .with("MonthlyCharges", monthly)
        .with("TotalCharges", total)
        .with("gender", "Female")
        .with("SeniorCitizen", "0")
        .with("Partner", "Yes")
        .with("Dependents", "No")
        .with("PhoneService", "Yes")
        .with("MultipleLines", "No")
        .with("InternetService", "Fiber optic")
        .with("OnlineSecurity", "No")
        .with("OnlineBackup", "Yes")
        .with("DeviceProtection", "No")
        .with("TechSupport", "No")
        .with("StreamingTV", "Yes")
        .with("StreamingMovies", "No")
        .with("Contract", contract)
        .with("PaperlessBilling", "Yes")
        .with("PaymentMethod", payment)
}

/// The JSON request body an HTTP caller would send for the same customer.
pub(crate) fn customer_json(tenure: i64, monthly: f64, total: f64, contract: &str, payment: &str) -> Value {
    json!({
        "tenure": tenure,
        "MonthlyCharges": monthly,
        "TotalCharges": total,
        "gender": "Female",
        "SeniorCitizen": 0,
        "Partner": "Yes",
        "Dependents": "No",
        "PhoneService": "Yes",
        "MultipleLines": "No",
        "InternetService": "Fiber optic",
        "OnlineSecurity": "No",
        "OnlineBackup": "Yes",
        "DeviceProtection": "No",
        "TechSupport": "No",
        "StreamingTV": "Yes",
        "StreamingMovies": "No",
        "Contract": contract,
        "PaperlessBilling": "Yes",
        "PaymentMethod": payment,
    })
}

/// 60 deterministic rows where short month-to-month customers churn.
pub(crate) fn training_records() -> (Vec<RawRecord>, Vec<bool>) {
    let mut rows   = Vec::new();
    let mut labels = Vec::new();

    for i in 0..60usize {
        let contract = CONTRACTS[i % 3];
        let tenure   = ((i * 7) % 72) as f64;
        let monthly  = 20.0 + ((i * 13) % 90) as f64;
        let total    = tenure * monthly;
        let churn    = contract == "Month-to-month" && tenure < 36.0;

        let mut r = customer(tenure, monthly, total, contract, PAYMENTS[i % 4])
            .with("InternetService", INTERNET[i % 3])
            .with("gender", if i % 2 == 0 { "Female" } else { "Male" })
            .with("SeniorCitizen", if i % 5 == 0 { "1" } else { "0" });
        if i % 4 == 1 {
            r.insert("TechSupport", "Yes");
        }
        rows.push(r);
        labels.push(churn);
    }

    (rows, labels)
}

/// One CSV data line in CSV_HEADER order.
pub(crate) fn csv_row(id: &str, tenure: &str, monthly: &str, total: &str, contract: &str, churn: &str) -> String {
    format!(
        "{id},Female,0,Yes,No,{tenure},No,No phone service,DSL,No,Yes,No,No,No,No,\
{contract},Yes,Electronic check,{monthly},{total},{churn}"
    )
}

/// `training_records` rendered as a telco CSV file. Row 3 has a blank
/// TotalCharges, the way the public dataset does for brand-new customers.
pub(crate) fn training_csv() -> String {
    let (rows, labels) = training_records();
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for (i, (record, churn)) in rows.iter().zip(labels).enumerate() {
        let cells: Vec<String> = CSV_HEADER
            .split(',')
            .map(|col| match col {
                "customerID" => format!("C{i:04}"),
                "Churn" => (if churn { "Yes" } else { "No" }).to_string(),
                "TotalCharges" if i == 3 => " ".to_string(),
                _ => match record.get(col) {
                    Some(FieldValue::Number(n)) => n.to_string(),
                    Some(FieldValue::Text(s)) => s.clone(),
                    None => String::new(),
                },
            })
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}
