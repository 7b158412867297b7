use crate::runner::Runner;
use chrono::NaiveDate;

pub const HEADER: [&str; 7] = [
    "Full Name",
    "Email",
    "Phone",
    "Category",
    "T-Shirt Size",
    "Confirmed",
    "Transaction ID",
];

pub fn file_name(event_slug: &str, date: NaiveDate) -> String {
    format!("{event_slug}-runners-{}.csv", date.format("%Y-%m-%d"))
}

pub fn to_csv<'a>(runners: impl IntoIterator<Item = &'a Runner>) -> String {
    let mut csv = String::new();
    write_row(&mut csv, HEADER);
    for runner in runners {
        write_row(
            &mut csv,
            [
                runner.full_name.as_str(),
                runner.email.as_str(),
                runner.phone.as_str(),
                runner.category.as_str(),
                runner.tshirt_size.as_str(),
                runner.confirmed.as_str(),
                runner.transaction_id.as_str(),
            ],
        );
    }
    csv
}

fn write_row<const N: usize>(csv: &mut String, fields: [&str; N]) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            csv.push(',');
        }
        write_field(csv, field);
    }
    csv.push('\n');
}

fn write_field(csv: &mut String, field: &str) {
    let guard = is_formula(field);
    if guard || field.contains([',', '"', '\r', '\n']) {
        csv.push('"');
        if guard {
            csv.push('\'');
        }
        csv.push_str(&field.replace('"', "\"\""));
        csv.push('"');
    } else {
        csv.push_str(field);
    }
}

// Cells starting with these are evaluated by spreadsheet apps. Phone numbers such as
// +8801712345678 are left alone.
fn is_formula(field: &str) -> bool {
    match field.chars().next() {
        Some('=' | '@' | '\t' | '\r') => true,
        Some('+' | '-') => !field[1..]
            .chars()
            .all(|it| it.is_ascii_digit() || it == ' '),
        _ => false,
    }
}
