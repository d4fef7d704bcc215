//! Contact list persisted under `sms_users`, with CSV import and export.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{KeyValueStore, StoreError};
use crate::services::numbering::NumberingPlan;
use crate::types::{Contact, ContactImportReport, ContactSummary, NewContact};

pub const CONTACTS_KEY: &str = "sms_users";

const EXPORT_HEADERS: [&str; 8] = [
    "Full Name",
    "Email",
    "Phone",
    "Company",
    "Location",
    "Category",
    "Notes",
    "Created Date",
];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")
});

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Please fill in all required fields (Name, Email, Phone).")]
    MissingField,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Please enter a valid phone number in international form (+{0}...).")]
    InvalidPhone(String),

    #[error("A contact with email '{0}' already exists.")]
    DuplicateEmail(String),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ContactBook {
    kv: Arc<dyn KeyValueStore>,
    plan: NumberingPlan,
    write_lock: Mutex<()>,
}

impl ContactBook {
    pub fn new(kv: Arc<dyn KeyValueStore>, plan: NumberingPlan) -> Self {
        Self {
            kv,
            plan,
            write_lock: Mutex::new(()),
        }
    }

    /// Contacts in insertion order. Empty if storage is missing or corrupt.
    pub fn list(&self) -> Vec<Contact> {
        let raw = match self.kv.get(CONTACTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read contacts: {}", e);
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Failed to parse contacts: {}", e);
            Vec::new()
        })
    }

    fn save(&self, contacts: &[Contact]) -> Result<(), StoreError> {
        let json = serde_json::to_string(contacts)?;
        self.kv.set(CONTACTS_KEY, &json)
    }

    /// Validate and append a contact. The phone is rewritten to
    /// international form before it is checked.
    pub fn add(&self, new: NewContact) -> Result<Contact, ContactError> {
        let _guard = self.write_lock.lock();
        let mut contacts = self.list();

        let contact = self.build(new)?;
        if contacts.iter().any(|c| c.email == contact.email) {
            return Err(ContactError::DuplicateEmail(contact.email));
        }

        contacts.push(contact.clone());
        self.save(&contacts)?;
        info!("Added contact {} ({})", contact.full_name, contact.id);
        Ok(contact)
    }

    fn build(&self, new: NewContact) -> Result<Contact, ContactError> {
        let full_name = new.full_name.trim().to_string();
        let email = new.email.trim().to_string();
        let phone = new.phone.trim();

        if full_name.is_empty() || email.is_empty() || phone.is_empty() {
            return Err(ContactError::MissingField);
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(ContactError::InvalidEmail);
        }

        let phone = self.plan.to_international(phone);
        if !self.plan.is_international(&phone) {
            return Err(ContactError::InvalidPhone(self.plan.country_code().to_string()));
        }

        Ok(Contact {
            id: Uuid::new_v4().to_string(),
            full_name,
            email,
            phone,
            company: new.company.trim().to_string(),
            location: new.location.trim().to_string(),
            category: new.category.trim().to_string(),
            notes: new.notes.trim().to_string(),
            created_at: Utc::now(),
        })
    }

    /// Case-insensitive match on name, email, company, location and
    /// category; phone matches as a plain substring. A blank query
    /// returns everything.
    pub fn search(&self, query: &str) -> Vec<Contact> {
        let query = query.trim();
        let contacts = self.list();
        if query.is_empty() {
            return contacts;
        }

        let needle = query.to_lowercase();
        contacts
            .into_iter()
            .filter(|c| {
                c.phone.contains(query)
                    || [&c.full_name, &c.email, &c.company, &c.location, &c.category]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let mut contacts = self.list();
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        if contacts.len() == before {
            return Ok(false);
        }
        self.save(&contacts)?;
        info!("Deleted contact {}", id);
        Ok(true)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        self.kv.remove(CONTACTS_KEY)?;
        info!("Cleared all contacts");
        Ok(())
    }

    /// Total plus distinct non-empty categories and companies.
    pub fn summary(&self) -> ContactSummary {
        let contacts = self.list();
        let categories: HashSet<&str> = contacts
            .iter()
            .map(|c| c.category.as_str())
            .filter(|v| !v.is_empty())
            .collect();
        let companies: HashSet<&str> = contacts
            .iter()
            .map(|c| c.company.as_str())
            .filter(|v| !v.is_empty())
            .collect();

        ContactSummary {
            total: contacts.len(),
            categories: categories.len(),
            companies: companies.len(),
        }
    }

    // ==========================================================================
    // CSV
    // ==========================================================================

    /// All contacts as CSV, dates as `YYYY-MM-DD`.
    pub fn export_csv(&self) -> Result<String, ContactError> {
        let contacts = self.list();
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(EXPORT_HEADERS)?;
        for c in &contacts {
            let created = c.created_at.format("%Y-%m-%d").to_string();
            writer.write_record([
                c.full_name.as_str(),
                c.email.as_str(),
                c.phone.as_str(),
                c.company.as_str(),
                c.location.as_str(),
                c.category.as_str(),
                c.notes.as_str(),
                created.as_str(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ContactError::Csv(e.into_error().into()))?;
        debug!("Exported {} contacts to CSV", contacts.len());
        Ok(String::from_utf8(bytes)?)
    }

    /// Import rows from CSV with a header line. Columns are matched by
    /// name, case-insensitively; `Full Name` (or `Name`), `Email` and
    /// `Phone` are required. Rows that are short, fail validation or
    /// repeat an existing email are skipped.
    pub fn import_csv(&self, content: &str) -> Result<ContactImportReport, ContactError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        let column = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));

        let name_col = column(&["full name", "name"]);
        let email_col = column(&["email"]);
        let phone_col = column(&["phone"]);

        let (Some(name_col), Some(email_col), Some(phone_col)) = (name_col, email_col, phone_col)
        else {
            let missing = [("full name", name_col), ("email", email_col), ("phone", phone_col)]
                .into_iter()
                .filter(|(_, col)| col.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(ContactError::MissingColumns(missing));
        };
        let company_col = column(&["company"]);
        let location_col = column(&["location"]);
        let category_col = column(&["category"]);
        let notes_col = column(&["notes"]);

        let _guard = self.write_lock.lock();
        let mut contacts = self.list();
        let mut report = ContactImportReport::default();

        for record in reader.records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            if record.len() < headers.len() {
                report.skipped += 1;
                continue;
            }

            let cell = |col: Option<usize>| {
                col.and_then(|i| record.get(i))
                    .unwrap_or_default()
                    .to_string()
            };
            let new = NewContact {
                full_name: cell(Some(name_col)),
                email: cell(Some(email_col)),
                phone: cell(Some(phone_col)),
                company: cell(company_col),
                location: cell(location_col),
                category: cell(category_col),
                notes: cell(notes_col),
            };

            match self.build(new) {
                Ok(contact) if contacts.iter().any(|c| c.email == contact.email) => {
                    report.skipped += 1;
                }
                Ok(contact) => {
                    contacts.push(contact);
                    report.imported += 1;
                }
                Err(e) => {
                    debug!("Skipping contact row: {}", e);
                    report.skipped += 1;
                }
            }
        }

        if report.imported > 0 {
            self.save(&contacts)?;
        }
        info!(
            "Imported {} contacts, skipped {}",
            report.imported, report.skipped
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryKeyValueStore;

    fn book() -> ContactBook {
        ContactBook::new(Arc::new(MemoryKeyValueStore::new()), NumberingPlan::ghana())
    }

    fn new_contact(name: &str, email: &str, phone: &str) -> NewContact {
        NewContact {
            full_name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_normalizes_phone() {
        let book = book();
        let contact = book
            .add(new_contact("Ama Mensah", "ama@example.com", "024 123 4567"))
            .unwrap();
        assert_eq!(contact.phone, "+233241234567");
        assert_eq!(book.list(), vec![contact]);
    }

    #[test]
    fn test_add_validates_fields() {
        let book = book();
        assert!(matches!(
            book.add(new_contact("", "a@b.co", "0241234567")),
            Err(ContactError::MissingField)
        ));
        assert!(matches!(
            book.add(new_contact("Ama", "not-an-email", "0241234567")),
            Err(ContactError::InvalidEmail)
        ));
        assert!(matches!(
            book.add(new_contact("Ama", "a@b.co", "0141234567")),
            Err(ContactError::InvalidPhone(_))
        ));
        assert!(book.list().is_empty());
    }

    #[test]
    fn test_add_rejects_duplicate_email() {
        let book = book();
        book.add(new_contact("Ama", "ama@example.com", "0241234567"))
            .unwrap();
        assert!(matches!(
            book.add(new_contact("Ama Two", "ama@example.com", "0551234567")),
            Err(ContactError::DuplicateEmail(_))
        ));
        assert_eq!(book.list().len(), 1);
    }

    #[test]
    fn test_search_delete_and_summary() {
        let book = book();
        let mut kofi = new_contact("Kofi Boateng", "kofi@example.com", "0201234567");
        kofi.company = "Acme".to_string();
        kofi.category = "customer".to_string();
        let kofi = book.add(kofi).unwrap();

        let mut ama = new_contact("Ama Mensah", "ama@example.com", "0241234567");
        ama.company = "Acme".to_string();
        ama.category = "vip".to_string();
        book.add(ama).unwrap();

        assert_eq!(book.search("KOFI").len(), 1);
        assert_eq!(book.search("acme").len(), 2);
        assert_eq!(book.search("+23324").len(), 1);
        assert_eq!(book.search("  ").len(), 2);

        let summary = book.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.categories, 2);
        assert_eq!(summary.companies, 1);

        assert!(book.delete(&kofi.id).unwrap());
        assert!(!book.delete(&kofi.id).unwrap());
        assert_eq!(book.list().len(), 1);

        book.clear().unwrap();
        assert!(book.list().is_empty());
    }

    #[test]
    fn test_export_csv_quotes_fields() {
        let book = book();
        let mut contact = new_contact("Mensah, Ama", "ama@example.com", "0241234567");
        contact.notes = "Says \"hi\"".to_string();
        let saved = book.add(contact).unwrap();

        let csv = book.export_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Full Name,Email,Phone,Company,Location,Category,Notes,Created Date")
        );
        let expected = format!(
            "\"Mensah, Ama\",ama@example.com,+233241234567,,,,\"Says \"\"hi\"\"\",{}",
            saved.created_at.format("%Y-%m-%d")
        );
        assert_eq!(lines.next(), Some(expected.as_str()));
    }

    #[test]
    fn test_import_csv_counts_imported_and_skipped() {
        let book = book();
        book.add(new_contact("Existing", "old@example.com", "0241234567"))
            .unwrap();

        let content = "Full Name,Email,Phone,Company\n\
                       Kofi,kofi@example.com,0201234567,Acme\n\
                       Dup,old@example.com,0551234567,\n\
                       Short,short@example.com\n\
                       Bad Phone,bad@example.com,12345,\n\
                       \"Mensah, Ama\",ama@example.com,+233 24 765 4321,\n\
                       Again,kofi@example.com,0201234567,\n\
                       \n";
        let report = book.import_csv(content).unwrap();

        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 4);

        let contacts = book.list();
        assert_eq!(contacts.len(), 3);
        assert_eq!(contacts[1].company, "Acme");
        assert_eq!(contacts[2].full_name, "Mensah, Ama");
        assert_eq!(contacts[2].phone, "+233247654321");
    }

    #[test]
    fn test_import_csv_requires_columns() {
        let book = book();
        let err = book.import_csv("Name,Company\nKofi,Acme\n").unwrap_err();
        match err {
            ContactError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["email", "phone"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_export_then_import_into_fresh_book() {
        let source = book();
        source
            .add(new_contact("Kofi", "kofi@example.com", "0201234567"))
            .unwrap();
        let csv = source.export_csv().unwrap();

        let target = book();
        let report = target.import_csv(&csv).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(target.list()[0].phone, "+233201234567");
    }
}
