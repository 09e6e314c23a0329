//! Test fixture creation for the care database

use anyhow::Result;
use carehub_agents::agents::jobs::today_window;
use carehub_agents::care_store::{LogType, SqliteCareStore, TaskStatus};
use chrono::{Duration, Local, Utc};

/// Seeds a care store with a small facility.
///
/// Rows that must fall inside "today" are stamped one hour after local
/// midnight. Message ages are measured from the current instant.
pub fn seed_care_data(store: &SqliteCareStore) -> Result<()> {
    let (day_start, _) = today_window(Local::now());
    let today = day_start + Duration::hours(1);
    let now = Utc::now();

    let alice = store.insert_resident("Alice Rossi", Some("101"))?;
    let bruno = store.insert_resident("Bruno Verdi", Some("102"))?;

    let joy = store.insert_staff("Nurse Joy", "nurse")?;
    let marco = store.insert_staff("Marco Neri", "caregiver")?;

    store.insert_inventory_item("Gloves", 3, 10, "boxes")?;
    store.insert_inventory_item("Wipes", 5, 5, "packs")?;
    store.insert_inventory_item("Gauze", 40, 10, "rolls")?;

    store.insert_activity_log(alice, Some(joy), LogType::Vitals, Some("BP 120/80"), today)?;
    store.insert_activity_log(bruno, Some(joy), LogType::Vitals, None, today)?;
    store.insert_activity_log(alice, Some(marco), LogType::Food, Some("Lunch"), today)?;

    store.insert_task("Morning round", TaskStatus::Completed, today)?;
    store.insert_task("Order gloves", TaskStatus::Pending, today)?;
    store.insert_task("Call pharmacy", TaskStatus::Pending, today)?;
    store.insert_task("Update care plan", TaskStatus::InProgress, today)?;

    store.insert_attendance(joy, today, None, today)?;
    store.insert_attendance(marco, today, Some(today), today)?;

    store.insert_family_message(
        alice,
        "Maria Rossi",
        "How did mum sleep last night?",
        true,
        now - Duration::hours(3),
    )?;
    store.insert_family_message(
        bruno,
        "Luca Verdi",
        "Thanks for the update",
        true,
        now - Duration::hours(5),
    )?;
    store.insert_family_message(
        bruno,
        "Nurse Joy",
        "He is doing well",
        false,
        now - Duration::hours(4),
    )?;

    Ok(())
}
