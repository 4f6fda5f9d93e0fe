//! Development data seeding
//!
//! Fills an empty database with workshops and registrations, either a fixed
//! dataset or randomly generated attendees.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::database::DatabaseService;
use crate::models::registration::{
    Attendee, AttendeeCategory, CreateRegistrationRequest, PaymentMethod, RegistrationStatus, WorkshopChoice,
};
use crate::models::session::{CreateSessionRequest, Session, SessionType};
use crate::services::registration::RegistrationService;
use crate::services::workshop::WorkshopService;
use crate::utils::errors::{IdmcError, Result};

const SEED_ADMIN: &str = "seed@idmc.local";

const FIRST_NAMES: &[&str] = &[
    "Maria", "Jose", "Ana", "Juan", "Grace", "Paolo", "Joy", "Mark", "Faith", "Daniel", "Ruth", "Samuel",
];
const LAST_NAMES: &[&str] = &[
    "Santos", "Reyes", "Cruz", "Bautista", "Garcia", "Mendoza", "Torres", "Flores", "Ramos", "Aquino",
];
const CHURCHES: &[(&str, &str)] = &[
    ("Grace Community Church", "Quezon City"),
    ("Living Word Fellowship", "Cebu City"),
    ("Christ the Rock Church", "Davao City"),
    ("New Life Baptist Church", "Iloilo City"),
];
const WORKSHOPS: &[(&str, &str, i32)] = &[
    ("Discipleship in the Digital Age", "Workshop Block A", 40),
    ("Children's Ministry Essentials", "Workshop Block A", 30),
    ("Leading Worship Teams", "Workshop Block B", 35),
    ("Missions and Church Planting", "Workshop Block B", 25),
];

#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Delete existing registrations first
    pub clear: bool,
    /// Seed even when registrations already exist
    pub force: bool,
    /// Insert the fixed dataset instead of random registrations
    pub static_data: bool,
    pub count: usize,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self { clear: false, force: false, static_data: false, count: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded(usize),
    NoChanges,
}

pub struct Seeder {
    database: DatabaseService,
    registrations: RegistrationService,
    workshops: WorkshopService,
}

fn attendee(first: &str, last: &str, email: String, phone: String) -> Attendee {
    Attendee {
        first_name: first.to_string(),
        last_name: last.to_string(),
        middle_name: None,
        email,
        phone,
        ministry_role: None,
    }
}

/// The fixed dataset: one registration per status path, two with companions
fn static_requests() -> Vec<(CreateRegistrationRequest, RegistrationStatus)> {
    let people = [
        ("Maria", "Santos", AttendeeCategory::Regular, 1, RegistrationStatus::Confirmed),
        ("Jose", "Reyes", AttendeeCategory::Student, 0, RegistrationStatus::PendingPayment),
        ("Grace", "Cruz", AttendeeCategory::Senior, 0, RegistrationStatus::PendingVerification),
        ("Paolo", "Garcia", AttendeeCategory::Regular, 2, RegistrationStatus::Confirmed),
        ("Ruth", "Mendoza", AttendeeCategory::Regular, 0, RegistrationStatus::Cancelled),
    ];

    people
        .iter()
        .enumerate()
        .map(|(i, (first, last, category, companions, status))| {
            let (church, city) = CHURCHES[i % CHURCHES.len()];
            let additional = (0..*companions)
                .map(|c| {
                    attendee(
                        FIRST_NAMES[(i + c + 3) % FIRST_NAMES.len()],
                        last,
                        format!("{}.{}.{}@example.com", first.to_lowercase(), last.to_lowercase(), c + 2),
                        String::new(),
                    )
                })
                .collect();

            let request = CreateRegistrationRequest {
                primary_attendee: attendee(
                    first,
                    last,
                    format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
                    format!("0917{:07}", 1_000_000 + i),
                ),
                additional_attendees: additional,
                category: *category,
                church_name: church.to_string(),
                church_city: Some(city.to_string()),
                workshop_choices: vec![],
                payment_method: Some(PaymentMethod::BankTransfer),
                payment_reference: None,
                proof_url: None,
            };
            (request, *status)
        })
        .collect()
}

fn pick<R: Rng>(rng: &mut R, names: &[&'static str]) -> &'static str {
    names.choose(rng).copied().unwrap_or("Guest")
}

fn random_request<R: Rng>(rng: &mut R, workshops: &[Session]) -> CreateRegistrationRequest {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    let tag: u32 = rng.gen_range(10_000..100_000);

    let companions = rng.gen_range(0..3);
    let additional: Vec<Attendee> = (0..companions)
        .map(|c| {
            let companion = pick(rng, FIRST_NAMES);
            attendee(
                companion,
                last,
                format!("{}.{}.{}{}@example.com", companion.to_lowercase(), last.to_lowercase(), tag, c),
                String::new(),
            )
        })
        .collect();

    let workshop_choices = match workshops.choose(rng) {
        Some(workshop) if rng.gen_bool(0.6) => vec![WorkshopChoice { attendee_index: 0, session_id: workshop.id.clone() }],
        _ => vec![],
    };

    let (church, city) = CHURCHES.choose(rng).copied().unwrap_or(CHURCHES[0]);
    let category = [AttendeeCategory::Regular, AttendeeCategory::Student, AttendeeCategory::Senior]
        .choose(rng)
        .copied()
        .unwrap_or(AttendeeCategory::Regular);

    CreateRegistrationRequest {
        primary_attendee: attendee(
            first,
            last,
            format!("{}.{}.{}@example.com", first.to_lowercase(), last.to_lowercase(), tag),
            format!("09{:09}", rng.gen_range(100_000_000..1_000_000_000u64)),
        ),
        additional_attendees: additional,
        category,
        church_name: church.to_string(),
        church_city: Some(city.to_string()),
        workshop_choices,
        payment_method: Some(PaymentMethod::Gcash),
        payment_reference: None,
        proof_url: rng.gen_bool(0.5).then(|| format!("https://storage.example.com/proofs/{}.jpg", tag)),
    }
}

impl Seeder {
    pub fn new(database: DatabaseService, registrations: RegistrationService, workshops: WorkshopService) -> Self {
        Self { database, registrations, workshops }
    }

    pub async fn run(&self, options: &SeedOptions) -> Result<SeedOutcome> {
        if options.clear {
            let removed = self.database.registrations.delete_all().await?;
            for mut session in self.database.sessions.list().await? {
                if session.registered_count != 0 {
                    session.registered_count = 0;
                    self.database.sessions.update(&session).await?;
                }
            }
            info!(removed = removed, "Cleared existing registrations and seat counts");
        } else if !options.force && self.database.registrations.count().await? > 0 {
            info!("Registrations already present, nothing seeded");
            return Ok(SeedOutcome::NoChanges);
        }

        let workshops = self.ensure_workshops().await?;

        let seeded = if options.static_data {
            self.seed_static().await?
        } else {
            self.seed_random(options.count, &workshops).await?
        };

        info!(seeded = seeded, "Seeding finished");
        Ok(if seeded == 0 { SeedOutcome::NoChanges } else { SeedOutcome::Seeded(seeded) })
    }

    async fn ensure_workshops(&self) -> Result<Vec<Session>> {
        let existing = self.workshops.list_workshops().await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let mut created = Vec::with_capacity(WORKSHOPS.len());
        for (title, slot, capacity) in WORKSHOPS {
            let session = self
                .workshops
                .create_session(
                    CreateSessionRequest {
                        title: title.to_string(),
                        description: None,
                        session_type: SessionType::Workshop,
                        speaker_ids: vec![],
                        venue: None,
                        starts_at: None,
                        ends_at: None,
                        capacity: Some(*capacity),
                        time_slot: Some(slot.to_string()),
                    },
                    SEED_ADMIN,
                )
                .await?;
            created.push(session);
        }
        Ok(created)
    }

    async fn seed_static(&self) -> Result<usize> {
        let mut seeded = 0;
        for (request, target) in static_requests() {
            let registration = match self.registrations.create_registration(request).await {
                Ok(registration) => registration,
                Err(IdmcError::DuplicateEmail { email }) => {
                    warn!(email = %email, "Static registration already present, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if target != registration.status {
                self.registrations
                    .update_status(&registration.id, target, SEED_ADMIN)
                    .await?;
            }
            seeded += 1;
        }
        Ok(seeded)
    }

    async fn seed_random(&self, count: usize, workshops: &[Session]) -> Result<usize> {
        let mut seeded = 0;
        for _ in 0..count {
            // ThreadRng is not Send, so keep it out of the awaits
            let request = {
                let mut rng = rand::thread_rng();
                random_request(&mut rng, workshops)
            };
            let confirm = rand::thread_rng().gen_bool(0.5);

            match self.registrations.create_registration(request).await {
                Ok(registration) => {
                    if confirm {
                        self.registrations
                            .update_status(&registration.id, RegistrationStatus::Confirmed, SEED_ADMIN)
                            .await?;
                    }
                    seeded += 1;
                }
                Err(IdmcError::DuplicateEmail { email }) => {
                    warn!(email = %email, "Random email collided, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        let total = self.database.registrations.count().await?;
        info!(seeded = seeded, total = total, "Random registrations inserted");
        Ok(seeded)
    }
}
