//! Doctor and patient directories.
//!
//! Directory records are created by an explicit registration step invoked by
//! the account-creation flow of the embedding application; there is no
//! reactive hook. Doctors become visible to patients only once an admin
//! flips the approval flag.

use chrono::Local;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository;
use crate::ledger::LedgerError;
use crate::models::*;
use crate::principal::{Principal, Role};

/// Creates the directory record for a newly registered doctor account.
/// Starts unapproved and therefore invisible to patients.
pub fn register_doctor(conn: &Connection, input: &NewDoctor) -> Result<DoctorRecord, LedgerError> {
    let now = Local::now().naive_local();
    let doctor = DoctorRecord {
        id: Uuid::new_v4(),
        name: input.name.clone(),
        email: input.email.clone(),
        specialty: input.specialty,
        bio: input.bio.clone(),
        location: input.location.clone(),
        consultation_fee: input.consultation_fee,
        experience_years: input.experience_years,
        is_approved: false,
        profile_picture: None,
        created_at: now,
        updated_at: now,
    };
    repository::insert_doctor(conn, &doctor)?;
    tracing::info!(doctor = %doctor.id, specialty = doctor.specialty.as_str(), "doctor registered");
    Ok(doctor)
}

/// Creates the directory record for a newly registered patient account.
pub fn register_patient(
    conn: &Connection,
    input: &NewPatient,
) -> Result<PatientRecord, LedgerError> {
    let now = Local::now().naive_local();
    let patient = PatientRecord {
        id: Uuid::new_v4(),
        name: input.name.clone(),
        email: input.email.clone(),
        date_of_birth: None,
        gender: None,
        blood_type: None,
        phone: None,
        address: None,
        emergency_contact: None,
        emergency_phone: None,
        medical_history: None,
        current_medications: None,
        allergies: None,
        profile_picture: None,
        created_at: now,
        updated_at: now,
    };
    repository::insert_patient(conn, &patient)?;
    tracing::info!(patient = %patient.id, "patient registered");
    Ok(patient)
}

/// Admin flips the approval flag that gates a doctor's visibility.
pub fn approve_doctor(
    conn: &Connection,
    acting: Principal,
    doctor_id: &Uuid,
) -> Result<(), LedgerError> {
    if !acting.is(Role::Admin) {
        return Err(LedgerError::Unauthorized);
    }
    repository::set_doctor_approval(conn, doctor_id, true)?;
    tracing::info!(doctor = %doctor_id, "doctor approved");
    Ok(())
}

/// The doctor edits their own profile fields.
pub fn update_doctor_profile(
    conn: &Connection,
    acting: Principal,
    doctor_id: &Uuid,
    update: &DoctorProfileUpdate,
) -> Result<(), LedgerError> {
    if !acting.is(Role::Doctor) || acting.id != *doctor_id {
        return Err(LedgerError::Unauthorized);
    }
    repository::update_doctor_profile(conn, doctor_id, update)?;
    Ok(())
}

/// The patient edits their own demographic and medical fields.
pub fn update_patient_profile(
    conn: &Connection,
    acting: Principal,
    patient_id: &Uuid,
    update: &PatientProfileUpdate,
) -> Result<(), LedgerError> {
    if !acting.is(Role::Patient) || acting.id != *patient_id {
        return Err(LedgerError::Unauthorized);
    }
    repository::update_patient_profile(conn, patient_id, update)?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<DoctorRecord>, LedgerError> {
    Ok(repository::get_doctor(conn, id)?)
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<PatientRecord>, LedgerError> {
    Ok(repository::get_patient(conn, id)?)
}

/// Patient-facing doctor detail: the approved record plus its advertised
/// availability windows. Unapproved doctors are indistinguishable from
/// absent ones.
pub fn doctor_detail(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<(DoctorRecord, Vec<AvailabilitySlot>), LedgerError> {
    let doctor = repository::get_doctor(conn, doctor_id)?
        .filter(|d| d.is_approved)
        .ok_or(LedgerError::NotFound { entity: "Doctor", id: *doctor_id })?;
    let slots = repository::list_availability(conn, doctor_id, true)?;
    Ok((doctor, slots))
}

/// Doctor sets (or replaces) their availability window for one weekday.
pub fn set_availability(
    conn: &Connection,
    acting: Principal,
    input: &NewAvailabilitySlot,
) -> Result<AvailabilitySlot, LedgerError> {
    if !acting.is(Role::Doctor) {
        return Err(LedgerError::Unauthorized);
    }
    if input.start_time >= input.end_time {
        return Err(LedgerError::InvalidSlotWindow);
    }

    let slot = AvailabilitySlot {
        id: Uuid::new_v4(),
        doctor_id: acting.id,
        day_of_week: input.day_of_week,
        start_time: input.start_time,
        end_time: input.end_time,
        is_available: input.is_available,
        created_at: Local::now().naive_local(),
    };
    repository::upsert_availability_slot(conn, &slot)?;
    Ok(slot)
}

/// All of a doctor's windows, for their own schedule management screen.
pub fn list_availability(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<AvailabilitySlot>, LedgerError> {
    Ok(repository::list_availability(conn, doctor_id, false)?)
}

/// Doctor deletes one of their own availability windows.
pub fn delete_availability(
    conn: &Connection,
    acting: Principal,
    slot_id: &Uuid,
) -> Result<(), LedgerError> {
    let owner = repository::slot_owner(conn, slot_id)?
        .ok_or(LedgerError::NotFound { entity: "AvailabilitySlot", id: *slot_id })?;
    if !acting.is(Role::Doctor) || acting.id != owner {
        return Err(LedgerError::Unauthorized);
    }
    repository::delete_availability_slot(conn, slot_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn sample_doctor() -> NewDoctor {
        NewDoctor {
            name: "Chen".into(),
            email: "chen@example.com".into(),
            specialty: Specialty::Cardiology,
            bio: "Cardiologist".into(),
            location: "Springfield, IL".into(),
            consultation_fee: 90.0,
            experience_years: 12,
        }
    }

    #[test]
    fn registered_doctor_starts_unapproved() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();
        assert!(!doctor.is_approved);

        let stored = get_doctor(&conn, &doctor.id).unwrap().unwrap();
        assert!(!stored.is_approved);
        assert_eq!(stored.specialty, Specialty::Cardiology);
        assert_eq!(stored.email, "chen@example.com");
    }

    #[test]
    fn admin_approves_doctor() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();

        approve_doctor(&conn, Principal::admin(Uuid::new_v4()), &doctor.id).unwrap();
        assert!(get_doctor(&conn, &doctor.id).unwrap().unwrap().is_approved);
    }

    #[test]
    fn non_admin_cannot_approve() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();

        let err = approve_doctor(&conn, Principal::doctor(doctor.id), &doctor.id).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized));
        assert!(!get_doctor(&conn, &doctor.id).unwrap().unwrap().is_approved);
    }

    #[test]
    fn approve_missing_doctor_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err =
            approve_doctor(&conn, Principal::admin(Uuid::new_v4()), &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity: "Doctor", .. }));
    }

    #[test]
    fn doctor_updates_own_profile() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();

        let update = DoctorProfileUpdate {
            specialty: Specialty::Neurology,
            bio: "Now a neurologist".into(),
            location: "Chicago, IL".into(),
            consultation_fee: 120.0,
            experience_years: 13,
            profile_picture: Some("doctor_profiles/chen.jpg".into()),
        };
        update_doctor_profile(&conn, Principal::doctor(doctor.id), &doctor.id, &update).unwrap();

        let stored = get_doctor(&conn, &doctor.id).unwrap().unwrap();
        assert_eq!(stored.specialty, Specialty::Neurology);
        assert_eq!(stored.consultation_fee, 120.0);
        assert_eq!(stored.profile_picture.as_deref(), Some("doctor_profiles/chen.jpg"));
    }

    #[test]
    fn other_doctor_cannot_update_profile() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();

        let update = DoctorProfileUpdate {
            specialty: Specialty::Surgery,
            bio: String::new(),
            location: String::new(),
            consultation_fee: 0.0,
            experience_years: 0,
            profile_picture: None,
        };
        let err = update_doctor_profile(&conn, Principal::doctor(Uuid::new_v4()), &doctor.id, &update)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized));
    }

    #[test]
    fn patient_updates_own_profile() {
        let conn = open_memory_database().unwrap();
        let patient = register_patient(
            &conn,
            &NewPatient { name: "Ada".into(), email: "ada@example.com".into() },
        )
        .unwrap();

        let update = PatientProfileUpdate {
            date_of_birth: chrono::NaiveDate::from_ymd_opt(1990, 5, 4),
            gender: Some(Gender::Female),
            blood_type: Some(BloodType::ONegative),
            allergies: Some("Penicillin".into()),
            ..Default::default()
        };
        update_patient_profile(&conn, Principal::patient(patient.id), &patient.id, &update).unwrap();

        let stored = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(stored.gender, Some(Gender::Female));
        assert_eq!(stored.blood_type, Some(BloodType::ONegative));
        assert_eq!(stored.allergies.as_deref(), Some("Penicillin"));
        assert_eq!(stored.date_of_birth, chrono::NaiveDate::from_ymd_opt(1990, 5, 4));
    }

    #[test]
    fn doctor_detail_hides_unapproved() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();

        let err = doctor_detail(&conn, &doctor.id).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity: "Doctor", .. }));

        approve_doctor(&conn, Principal::admin(Uuid::new_v4()), &doctor.id).unwrap();
        let (detail, slots) = doctor_detail(&conn, &doctor.id).unwrap();
        assert_eq!(detail.id, doctor.id);
        assert!(slots.is_empty());
    }

    #[test]
    fn availability_set_and_listed_in_week_order() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();
        let acting = Principal::doctor(doctor.id);

        for day in [Weekday::Friday, Weekday::Monday] {
            set_availability(
                &conn,
                acting,
                &NewAvailabilitySlot {
                    day_of_week: day,
                    start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
                    is_available: true,
                },
            )
            .unwrap();
        }

        let slots = list_availability(&conn, &doctor.id).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].day_of_week, Weekday::Monday);
        assert_eq!(slots[1].day_of_week, Weekday::Friday);
    }

    #[test]
    fn availability_replaces_same_weekday() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();
        let acting = Principal::doctor(doctor.id);

        for (start, end) in [(9, 12), (10, 16)] {
            set_availability(
                &conn,
                acting,
                &NewAvailabilitySlot {
                    day_of_week: Weekday::Tuesday,
                    start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
                    is_available: true,
                },
            )
            .unwrap();
        }

        let slots = list_availability(&conn, &doctor.id).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(slots[0].end_time, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }

    #[test]
    fn replacing_slot_returns_the_live_id() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();
        let acting = Principal::doctor(doctor.id);

        let window = |start, end| NewAvailabilitySlot {
            day_of_week: Weekday::Tuesday,
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
            is_available: true,
        };
        set_availability(&conn, acting, &window(9, 12)).unwrap();
        let replacement = set_availability(&conn, acting, &window(10, 16)).unwrap();

        // The stored row carries the replacement's id, so the returned
        // value remains a usable handle.
        let slots = list_availability(&conn, &doctor.id).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].id, replacement.id);

        delete_availability(&conn, acting, &replacement.id).unwrap();
        assert!(list_availability(&conn, &doctor.id).unwrap().is_empty());
    }

    #[test]
    fn availability_rejects_inverted_window() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();

        let err = set_availability(
            &conn,
            Principal::doctor(doctor.id),
            &NewAvailabilitySlot {
                day_of_week: Weekday::Monday,
                start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                is_available: true,
            },
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidSlotWindow));
    }

    #[test]
    fn delete_availability_requires_owner() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, &sample_doctor()).unwrap();
        let slot = set_availability(
            &conn,
            Principal::doctor(doctor.id),
            &NewAvailabilitySlot {
                day_of_week: Weekday::Wednesday,
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                is_available: true,
            },
        )
        .unwrap();

        let err = delete_availability(&conn, Principal::doctor(Uuid::new_v4()), &slot.id)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized));

        delete_availability(&conn, Principal::doctor(doctor.id), &slot.id).unwrap();
        assert!(list_availability(&conn, &doctor.id).unwrap().is_empty());
    }
}
