//! Fabricated employee directory.
//!
//! There is no upstream API for employees: records are generated from a
//! seedable RNG so a fixed dataset can be produced once at startup and
//! returned unchanged on every call.

use chrono::{Days, NaiveDate, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Alan", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Frances", "Edsger",
    "Radia", "Donald", "Katherine", "John", "Hedy", "Niklaus",
];
const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Turing", "Torvalds", "Hamilton", "Ritchie", "Liskov", "Thompson",
    "Allen", "Dijkstra", "Perlman", "Knuth", "Johnson", "Backus", "Lamarr", "Wirth",
];
const JOB_TITLES: &[&str] = &[
    "Software Engineer",
    "Product Manager",
    "Data Analyst",
    "Site Reliability Engineer",
    "UX Designer",
    "Technical Writer",
    "Engineering Manager",
    "QA Engineer",
];
const DEPARTMENTS: &[&str] = &[
    "Engineering", "Product", "Design", "Operations", "Finance", "Marketing", "Sales", "Support",
];
const CITIES: &[(&str, &str)] = &[
    ("Portland", "Oregon"),
    ("Austin", "Texas"),
    ("Denver", "Colorado"),
    ("Madison", "Wisconsin"),
    ("Raleigh", "North Carolina"),
    ("Boise", "Idaho"),
];
const STREETS: &[&str] = &["Oak", "Maple", "Cedar", "Pine", "Elm", "Lake", "Hill", "Park"];

const MIN_AGE_YEARS: u64 = 18;
const MAX_AGE_YEARS: u64 = 65;
const MAX_TENURE_YEARS: u64 = 10;
const DAYS_PER_YEAR: u64 = 365;

/// Postal address of an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// An employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub avatar: String,
    pub job_title: String,
    pub department: String,
    pub birth_date: NaiveDate,
    pub address: Address,
    pub salary: u32,
    pub hire_date: NaiveDate,
}

/// Employee record without an id, as submitted on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub avatar: String,
    pub job_title: String,
    pub department: String,
    pub birth_date: NaiveDate,
    pub address: Address,
    pub salary: u32,
    pub hire_date: NaiveDate,
}

/// Partial update of an employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<u32>,
}

impl Person {
    /// Attaches an id to a new record.
    pub fn from_new(id: Uuid, new: NewPerson) -> Self {
        Self {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            avatar: new.avatar,
            job_title: new.job_title,
            department: new.department,
            birth_date: new.birth_date,
            address: new.address,
            salary: new.salary,
            hire_date: new.hire_date,
        }
    }

    /// Returns "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive match on name, email and job title.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [&self.first_name, &self.last_name, &self.email, &self.job_title]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }

    /// Returns a copy with every field present in `patch` applied. The id never changes.
    pub fn patched(&self, patch: &PersonPatch) -> Self {
        let mut person = self.clone();
        if let Some(v) = &patch.first_name {
            person.first_name = v.clone();
        }
        if let Some(v) = &patch.last_name {
            person.last_name = v.clone();
        }
        if let Some(v) = &patch.email {
            person.email = v.clone();
        }
        if let Some(v) = &patch.job_title {
            person.job_title = v.clone();
        }
        if let Some(v) = &patch.department {
            person.department = v.clone();
        }
        if let Some(v) = patch.salary {
            person.salary = v;
        }
        person
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, values: &[&'a str]) -> &'a str {
    values.choose(rng).copied().unwrap_or_default()
}

fn days_ago(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(today)
}

/// Generates one employee.
pub fn generate_person<R: Rng + ?Sized>(rng: &mut R) -> Person {
    let today = Utc::now().date_naive();
    let first_name = pick(rng, FIRST_NAMES).to_string();
    let last_name = pick(rng, LAST_NAMES).to_string();
    let id = uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid();
    let (city, state) = CITIES.choose(rng).copied().unwrap_or(("Portland", "Oregon"));

    let age_days = rng.gen_range(MIN_AGE_YEARS * DAYS_PER_YEAR..=MAX_AGE_YEARS * DAYS_PER_YEAR);
    let tenure_days = rng.gen_range(1..=MAX_TENURE_YEARS * DAYS_PER_YEAR);

    Person {
        id,
        email: format!(
            "{}.{}@example.com",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        ),
        phone: format!(
            "555-{:03}-{:04}",
            rng.gen_range(100..1000),
            rng.gen_range(0..10_000)
        ),
        avatar: format!("https://i.pravatar.cc/150?u={}", id),
        job_title: pick(rng, JOB_TITLES).to_string(),
        department: pick(rng, DEPARTMENTS).to_string(),
        birth_date: days_ago(today, age_days),
        address: Address {
            street: format!("{} {} Street", rng.gen_range(1..9999), pick(rng, STREETS)),
            city: city.to_string(),
            state: state.to_string(),
            zip_code: format!("{:05}", rng.gen_range(10_000..100_000)),
            country: "United States".to_string(),
        },
        salary: rng.gen_range(30_000..=150_000),
        hire_date: days_ago(today, tenure_days),
        first_name,
        last_name,
    }
}

/// Generates `count` employees.
pub fn generate_persons<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Person> {
    (0..count).map(|_| generate_person(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_persons(&mut StdRng::seed_from_u64(7), 5);
        let b = generate_persons(&mut StdRng::seed_from_u64(7), 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_fields_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let today = Utc::now().date_naive();

        for person in generate_persons(&mut rng, 50) {
            assert!((30_000..=150_000).contains(&person.salary));
            assert!(person.hire_date <= today);
            assert!(person.birth_date < person.hire_date);
            assert!(person.email.ends_with("@example.com"));
        }
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let mut person = generate_person(&mut StdRng::seed_from_u64(1));
        person.first_name = "Grace".to_string();
        person.job_title = "Data Analyst".to_string();

        assert!(person.matches("grace"));
        assert!(person.matches("ANALYST"));
        assert!(!person.matches("zzz"));
    }

    #[test]
    fn test_patched_keeps_id() {
        let person = generate_person(&mut StdRng::seed_from_u64(3));
        let patched = person.patched(&PersonPatch {
            salary: Some(99_000),
            ..PersonPatch::default()
        });

        assert_eq!(patched.id, person.id);
        assert_eq!(patched.salary, 99_000);
        assert_eq!(patched.first_name, person.first_name);
    }
}
