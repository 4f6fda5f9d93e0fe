//! Invoice numbering service

use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::info;

use crate::database::store::SettingsStore;
use crate::models::registration::{Invoice, Registration};
use crate::utils::errors::Result;
use crate::utils::helpers::format_invoice_number;

#[derive(Clone)]
pub struct InvoiceService {
    settings: Arc<dyn SettingsStore>,
}

impl InvoiceService {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Take the next invoice number for `year`. Numbers are never reused.
    pub async fn next_invoice_number(&self, year: i32) -> Result<String> {
        let sequence = self.settings.next_invoice_sequence(year).await?;
        Ok(format_invoice_number(year, sequence))
    }

    /// Invoice for a registration; an already issued invoice is returned as is
    pub async fn issue_invoice(&self, registration: &Registration) -> Result<Invoice> {
        if let Some(existing) = &registration.invoice {
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let number = self.next_invoice_number(now.year()).await?;
        info!(registration_id = %registration.id, invoice = %number, "Invoice issued");

        Ok(Invoice {
            number,
            amount: registration.payment.amount,
            issued_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn test_invoice_numbers_are_sequential_per_year() {
        let service = InvoiceService::new(Arc::new(MemoryStore::new()));

        assert_eq!(service.next_invoice_number(2026).await.unwrap(), "INV-2026-0001");
        assert_eq!(service.next_invoice_number(2026).await.unwrap(), "INV-2026-0002");
        assert_eq!(service.next_invoice_number(2027).await.unwrap(), "INV-2027-0001");
        assert_eq!(service.next_invoice_number(2026).await.unwrap(), "INV-2026-0003");
    }
}
