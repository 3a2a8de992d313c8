use tracing::{debug, warn};

use crate::models::tracker::{
    ConnectionStatus, ProcessedVehicleData, TrackerMessage, TrackerPacket, VehicleState,
};

/// l/100 km at normal speeds.
const BASE_CONSUMPTION_L_PER_100KM: f64 = 8.0;
const HIGH_SPEED_KMH: f64 = 60.0;
const HIGH_SPEED_MULTIPLIER: f64 = 1.2;

/// Parses a raw tracker payload and folds it into `state`.
///
/// Unparseable payloads and payloads without a device id are logged and
/// skipped, leaving the caller's state as it was.
pub fn process_message(
    state: &VehicleState,
    payload: &[u8],
) -> Option<(ProcessedVehicleData, VehicleState)> {
    let message: TrackerMessage = match serde_json::from_slice(payload) {
        Ok(m) => m,
        Err(e) => {
            warn!("Failed to parse tracker payload: {}", e);
            return None;
        }
    };

    let device_id = match message.get_device_id() {
        Some(id) => id.clone(),
        None => {
            warn!("Tracker payload missing device_id, skipping");
            return None;
        }
    };

    Some(process_packet(&device_id, state, &message.data))
}

/// Folds one packet into the device's running counters.
///
/// The previous state is only read; the updated state is returned for the
/// caller to keep.
pub fn process_packet(
    device_id: &str,
    state: &VehicleState,
    packet: &TrackerPacket,
) -> (ProcessedVehicleData, VehicleState) {
    let elapsed_minutes = match state.last_timestamp {
        Some(last) if packet.timestamp >= last => (packet.timestamp - last) as f64 / 60_000.0,
        Some(last) => {
            warn!(
                "Out-of-order packet for device {}: {} before {}",
                device_id, packet.timestamp, last
            );
            0.0
        }
        None => 0.0,
    };

    let driving_time = if packet.speed > 0.0 {
        state.total_driving_time + elapsed_minutes
    } else {
        state.total_driving_time
    };
    let motor_hours = if packet.engine_on {
        state.motor_hours + elapsed_minutes / 60.0
    } else {
        state.motor_hours
    };
    let fuel_consumption = interval_fuel(packet.speed, elapsed_minutes);

    let processed = ProcessedVehicleData {
        device_id: device_id.to_string(),
        vehicle_id: format!("vehicle_{}", device_id),
        driving_time,
        fuel_consumption,
        rpm: estimated_rpm(packet.speed),
        is_driver_authenticated: packet.rfid_id.as_deref().is_some_and(|id| !id.is_empty()),
        connection_status: ConnectionStatus::Connected,
        motor_hours,
    };

    let next = VehicleState {
        last_timestamp: Some(state.last_timestamp.map_or(packet.timestamp, |t| t.max(packet.timestamp))),
        total_driving_time: driving_time,
        total_fuel_used: state.total_fuel_used + fuel_consumption,
        motor_hours,
    };

    debug!(
        "Device {}: +{:.2} min, driving {:.1} min, fuel {:.3} l",
        device_id, elapsed_minutes, driving_time, next.total_fuel_used
    );

    (processed, next)
}

/// Liters burnt covering `speed` km/h for `minutes`.
fn interval_fuel(speed: f64, minutes: f64) -> f64 {
    let multiplier = if speed > HIGH_SPEED_KMH {
        HIGH_SPEED_MULTIPLIER
    } else {
        1.0
    };
    let distance_km = speed * minutes / 60.0;
    distance_km * BASE_CONSUMPTION_L_PER_100KM * multiplier / 100.0
}

fn estimated_rpm(speed: f64) -> u32 {
    (speed * 40.0 + 800.0).round().max(0.0) as u32
}
