use crate::error::RegistryError;
use crate::registry::{FieldChanges, Registry};
use crate::runner::{Confirmed, DEFAULT_PHONE_PREFIX, Runner, phone_matches};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry backed by a vector, with the same matching rules as the sheet script.
#[derive(Debug)]
pub struct InMemoryRegistry {
    runners: RwLock<Vec<Runner>>,
    phone_prefix: String,
}

impl InMemoryRegistry {
    pub fn new(runners: Vec<Runner>, phone_prefix: &str) -> Self {
        Self {
            runners: RwLock::new(runners),
            phone_prefix: phone_prefix.to_string(),
        }
    }

    pub fn demo(phone_prefix: &str) -> Self {
        Self::new(demo_runners(), phone_prefix)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Runner>> {
        self.runners.read().unwrap_or_else(|it| it.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Runner>> {
        self.runners.write().unwrap_or_else(|it| it.into_inner())
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_PHONE_PREFIX)
    }
}

impl Registry for InMemoryRegistry {
    async fn find_runner(&self, query: &str) -> Result<Runner, RegistryError> {
        self.read()
            .iter()
            .find(|it| it.matches(query, &self.phone_prefix))
            .cloned()
            .ok_or(RegistryError::NotFound)
    }

    async fn list_runners(&self) -> Result<Vec<Runner>, RegistryError> {
        Ok(self.read().clone())
    }

    async fn set_confirmed(&self, phone: &str) -> Result<(), RegistryError> {
        let mut runners = self.write();
        let runner = runners
            .iter_mut()
            .find(|it| phone_matches(&it.phone, phone, &self.phone_prefix))
            .ok_or(RegistryError::NotFound)?;
        runner.confirmed = Confirmed::Yes;
        Ok(())
    }

    async fn update_fields(&self, phone: &str, changes: &FieldChanges) -> Result<(), RegistryError> {
        let mut runners = self.write();
        let runner = runners
            .iter_mut()
            .find(|it| phone_matches(&it.phone, phone, &self.phone_prefix))
            .ok_or(RegistryError::NotFound)?;
        changes.apply(runner);
        Ok(())
    }
}

fn runner(
    full_name: &str,
    email: &str,
    phone: &str,
    category: &str,
    tshirt_size: &str,
    transaction_id: &str,
) -> Runner {
    Runner {
        full_name: full_name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        alternative_phone: String::new(),
        date_of_birth: String::new(),
        address: String::new(),
        gender: String::new(),
        tshirt_size: tshirt_size.to_string(),
        accommodation: "No".to_string(),
        category: category.to_string(),
        payment_number: phone.to_string(),
        transaction_id: transaction_id.to_string(),
        confirmed: Confirmed::No,
    }
}

pub(crate) fn demo_runners() -> Vec<Runner> {
    vec![
        Runner {
            alternative_phone: "+8801812345678".to_string(),
            date_of_birth: "1990-01-15".to_string(),
            address: "Sylhet, Bangladesh".to_string(),
            gender: "Male".to_string(),
            ..runner(
                "আহমেদ করিম",
                "ahmed.karim@example.com",
                "+8801712345678",
                "21 KM Half Marathon",
                "L",
                "TX123456789",
            )
        },
        Runner {
            alternative_phone: "+8801887654321".to_string(),
            date_of_birth: "1985-05-20".to_string(),
            address: "Dhaka, Bangladesh".to_string(),
            gender: "Female".to_string(),
            accommodation: "Yes".to_string(),
            ..runner(
                "ফাতিমা খাতুন",
                "fatima.khatun@example.com",
                "+8801787654321",
                "10 KM Long Run",
                "M",
                "TX987654321",
            )
        },
        Runner {
            gender: "Male".to_string(),
            confirmed: Confirmed::Yes,
            ..runner(
                "রহিম উদ্দিন",
                "rahim.uddin@example.com",
                "+8801512345678",
                "Student 10K",
                "XL",
                "TX456789123",
            )
        },
        Runner {
            gender: "Female".to_string(),
            ..runner(
                "সারা বেগম",
                "sara.begum@example.com",
                "+8801612345678",
                "Kids 1 KM Fun Run",
                "S Kids'",
                "TX789123456",
            )
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::TShirtSize;

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::demo(DEFAULT_PHONE_PREFIX)
    }

    #[tokio::test]
    async fn test_find_by_phone() {
        let registry = registry();
        let runner = registry.find_runner("+8801712345678").await.unwrap();
        assert_eq!("আহমেদ করিম", runner.full_name);
        assert_eq!("21 KM Half Marathon", runner.category);
        assert_eq!(Confirmed::No, runner.confirmed);
        let runner = registry.find_runner("01712345678").await.unwrap();
        assert_eq!("আহমেদ করিম", runner.full_name);
    }

    #[tokio::test]
    async fn test_find_by_transaction_id() {
        let runner = registry().find_runner("TX987654321").await.unwrap();
        assert_eq!("ফাতিমা খাতুন", runner.full_name);
    }

    #[tokio::test]
    async fn test_every_known_key_finds_its_runner() {
        let registry = registry();
        for expected in demo_runners() {
            let without_prefix = expected.phone.strip_prefix("+88").unwrap().to_string();
            for query in [&expected.phone, &without_prefix, &expected.transaction_id] {
                assert_eq!(expected, registry.find_runner(query).await.unwrap());
            }
        }
    }

    #[tokio::test]
    async fn test_not_found() {
        assert!(matches!(
            registry().find_runner("0000000000").await,
            Err(RegistryError::NotFound)
        ));
        assert!(matches!(
            registry().find_runner("").await,
            Err(RegistryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent() {
        let registry = registry();
        registry.set_confirmed("+8801712345678").await.unwrap();
        registry.set_confirmed("+8801712345678").await.unwrap();
        let runner = registry.find_runner("+8801712345678").await.unwrap();
        assert_eq!(Confirmed::Yes, runner.confirmed);
        assert!(matches!(
            registry.set_confirmed("+8800000000000").await,
            Err(RegistryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let registry = registry();
        registry
            .update_fields(
                "01787654321",
                &FieldChanges {
                    full_name: Some("ফাতিমা বেগম".to_string()),
                    tshirt_size: None,
                },
            )
            .await
            .unwrap();
        let runner = registry.find_runner("TX987654321").await.unwrap();
        assert_eq!("ফাতিমা বেগম", runner.full_name);
        assert_eq!("M", runner.tshirt_size);
        registry
            .update_fields(
                "+8801787654321",
                &FieldChanges {
                    full_name: None,
                    tshirt_size: Some(TShirtSize::Xxl),
                },
            )
            .await
            .unwrap();
        let runner = registry.find_runner("TX987654321").await.unwrap();
        assert_eq!("ফাতিমা বেগম", runner.full_name);
        assert_eq!("XXL", runner.tshirt_size);
    }
}
