use electriscan_core::{
    listener, BatteryConsumption, ChangeKind, Consumption, Device, DeviceCategory, DeviceKind,
    DeviceRecord, DomainError, EnergyUnit, EntityKind, Household, Orientation, Room, RoomRecord,
    RoomType, SolarPanel, SolarRecord, TimeUnit,
};
use std::sync::{Arc, Mutex};

fn phone(id: u32, owner_id: u32) -> Device {
    Device::mobile(
        id,
        owner_id,
        "Phone",
        DeviceCategory::Communication,
        BatteryConsumption {
            charging_cycles_per_year: 365,
            capacity_watt_seconds: 36_000,
            cycle_unit: TimeUnit::Year,
            energy_unit: EnergyUnit::WattHour,
        },
    )
}

fn room_record(name: &str) -> RoomRecord<'_> {
    RoomRecord {
        room_type: RoomType::Bedroom,
        name,
        size: 12.0,
    }
}

#[test]
fn default_household_is_empty() {
    let household = Household::default();
    assert_eq!(household.name(), "Default Household");
    assert_eq!(household.postal_code(), 1000);
    assert_eq!(household.residents(), 1);
    assert_eq!(household.room_count(), 0);
    assert_eq!(household.solar_panel_count(), 0);
    assert_eq!(household.free_room_id(), 1);
    assert_eq!(household.yearly_consumption_watt_seconds(), 0);
}

#[test]
fn free_ids_fill_gaps_first() {
    let mut household = Household::new("Home", 8400, 2);
    for name in ["One", "Two", "Three"] {
        household.add_room_from_record(&room_record(name)).unwrap();
    }
    household.remove_room(2).unwrap();
    assert_eq!(household.free_room_id(), 2);
    assert_eq!(household.add_room_from_record(&room_record("Again")).unwrap(), 2);
    assert_eq!(household.free_room_id(), 4);

    let panel = SolarRecord {
        name: "Roof",
        area: 5.0,
        orientation: Orientation::South,
    };
    assert_eq!(household.add_solar_panel_from_record(&panel).unwrap(), 1);
    assert_eq!(household.add_solar_panel_from_record(&panel).unwrap(), 2);
    household.remove_solar_panel(1).unwrap();
    assert_eq!(household.free_solar_panel_id(), 1);
}

#[test]
fn duplicate_and_missing_ids_are_domain_errors() {
    let mut household = Household::new("Home", 8400, 2);
    household.add_room(Room::new(5, "Loft", RoomType::Attic, 20.0)).unwrap();

    assert_eq!(
        household.add_room(Room::new(5, "Copy", RoomType::Attic, 1.0)),
        Err(DomainError::IdInUse {
            kind: EntityKind::Room,
            id: 5,
        })
    );
    assert_eq!(
        household.remove_room(9).unwrap_err(),
        DomainError::RoomNotFound(9)
    );
    assert_eq!(
        household.remove_solar_panel(1).unwrap_err(),
        DomainError::SolarPanelNotFound(1)
    );

    let loft = household.room_mut(5).unwrap();
    assert_eq!(
        loft.add_device(phone(1, 4)),
        Err(DomainError::OwnerMismatch {
            room_id: 5,
            owner_id: 4,
        })
    );
    loft.add_device(phone(1, 5)).unwrap();
    assert_eq!(
        loft.add_device(phone(1, 5)),
        Err(DomainError::IdInUse {
            kind: EntityKind::Device,
            id: 1,
        })
    );
    assert_eq!(
        loft.remove_device(3).unwrap_err(),
        DomainError::DeviceNotFound {
            room_id: 5,
            device_id: 3,
        }
    );
}

#[test]
fn device_kind_must_match_consumption() {
    let battery = Consumption::Battery(BatteryConsumption {
        charging_cycles_per_year: 1,
        capacity_watt_seconds: 1,
        cycle_unit: TimeUnit::Year,
        energy_unit: EnergyUnit::WattSecond,
    });
    let error = Device::new(1, 1, DeviceKind::Wired, "Lamp", DeviceCategory::Lighting, battery)
        .unwrap_err();
    assert_eq!(
        error,
        DomainError::ConsumptionTypeMismatch {
            expected: DeviceKind::Wired,
            found: DeviceKind::Mobile,
        }
    );

    let mut room = Room::new(1, "Hall", RoomType::Foyer, 4.0);
    let record = DeviceRecord {
        kind: DeviceKind::Wired,
        name: "Lamp",
        category: DeviceCategory::Lighting,
        consumption: battery,
    };
    assert!(room.add_device_from_record(&record).is_err());
    assert_eq!(room.device_count(), 0);
}

#[test]
fn all_devices_spans_rooms_in_id_order() {
    let mut household = Household::new("Home", 8400, 2);
    let second = household.add_room_from_record(&room_record("Second")).unwrap();
    let first = household.add_room_from_record(&room_record("First")).unwrap();
    household.room_mut(second).unwrap().add_device(phone(2, second)).unwrap();
    household.room_mut(second).unwrap().add_device(phone(1, second)).unwrap();
    household.room_mut(first).unwrap().add_device(phone(1, first)).unwrap();

    let ids: Vec<(u32, u32)> = household
        .all_devices()
        .iter()
        .map(|device| (device.owner_id(), device.id()))
        .collect();
    assert_eq!(ids, vec![(1, 1), (1, 2), (2, 1)]);
    // 365 * 36000 / 3600 per phone
    assert_eq!(household.yearly_consumption_watt_seconds(), 3 * 3_650);
}

#[test]
fn membership_changes_are_announced() {
    let mut household = Household::new("Home", 8400, 2);
    let events: Arc<Mutex<Vec<(ChangeKind, EntityKind, u32)>>> = Arc::default();
    let sink = Arc::clone(&events);
    household.subscribe(listener(move |event| {
        sink.lock()
            .unwrap()
            .push((event.kind, event.source, event.id));
    }));

    household
        .add_solar_panel(SolarPanel::new(3, "Roof", 4.0, Orientation::East))
        .unwrap();
    let room_id = household.add_room_from_record(&room_record("Den")).unwrap();
    household.remove_solar_panel(3).unwrap();
    household.remove_room(room_id).unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            (ChangeKind::ChildAdded, EntityKind::SolarPanel, 3),
            (ChangeKind::ChildAdded, EntityKind::Room, 1),
            (ChangeKind::ChildRemoved, EntityKind::SolarPanel, 3),
            (ChangeKind::ChildRemoved, EntityKind::Room, 1),
        ]
    );
}
