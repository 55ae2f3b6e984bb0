// Drive base geometry
// Each wheel contributes one row of the mixing matrix that maps a body twist to wheel speed.

use super::kinematics::{body_to_motor_speeds, KinematicsError, MotorSpeeds, Result, VelocityCommand};

/// X-drive wheel configuration (default base)
pub const X_DRIVE_BASE_RADIUS: f64 = 0.2; // meters (distance from center to wheel)
pub const X_DRIVE_MAX_WHEEL_SPEED: f64 = 1.0; // m/s at full motor output

/// Rolling directions (degrees): corner position + 90° so positive yaw spins every wheel forward
/// Corners: front_left 135°, front_right 45°, rear_left 225°, rear_right 315°
const X_DRIVE_WHEELS: [(&str, f64); 4] = [
    ("front_left", 225.0),
    ("front_right", 135.0),
    ("rear_left", 315.0),
    ("rear_right", 45.0),
];

/// Kiwi (3-wheel) configuration
pub const KIWI_BASE_RADIUS: f64 = 0.125; // meters
pub const KIWI_MAX_WHEEL_SPEED: f64 = 0.5; // m/s

/// Wheel mounting angles (degrees) with -90° offset
/// Left wheel at 240°, Back wheel at 0°, Right wheel at 120°
const KIWI_WHEELS: [(&str, f64); 3] = [
    ("left", 240.0 - 90.0),
    ("back", 360.0 - 90.0),
    ("right", 120.0 - 90.0),
];

/// One driven wheel on the base
#[derive(Debug, Clone, PartialEq)]
pub struct WheelMount {
    pub name: String,
    /// Rolling direction in the body frame, degrees CCW from +x (forward)
    pub angle_deg: f64,
    /// Distance from the base centre, meters
    pub radial_offset: f64,
}

impl WheelMount {
    pub fn new(name: impl Into<String>, angle_deg: f64, radial_offset: f64) -> Self {
        Self {
            name: name.into(),
            angle_deg,
            radial_offset,
        }
    }

    /// Mixing row over [linear_x, linear_y, linear_z, angular_x, angular_y, angular_z]
    ///
    /// Wheel speed = projection of the body velocity on the rolling direction
    /// plus yaw rate times radial offset. A planar base ignores z, roll and pitch.
    fn mixing_row(&self) -> [f64; 6] {
        let angle_rad = self.angle_deg.to_radians();
        [
            angle_rad.cos(),
            angle_rad.sin(),
            0.0,
            0.0,
            0.0,
            self.radial_offset,
        ]
    }
}

/// Geometry of a holonomic drive base
#[derive(Debug, Clone)]
pub struct DriveLayout {
    wheels: Vec<WheelMount>,
    rows: Vec<[f64; 6]>,
    max_wheel_speed: f64,
}

impl DriveLayout {
    /// Build a layout from wheel mounts and the wheel speed (m/s) reached at full motor output
    pub fn new(wheels: Vec<WheelMount>, max_wheel_speed: f64) -> Result<Self> {
        if wheels.is_empty() {
            return Err(KinematicsError::InvalidLayout("no wheels".to_string()));
        }
        // Subnormal full scale would overflow every normalized speed
        if !max_wheel_speed.is_finite() || max_wheel_speed < f64::MIN_POSITIVE {
            return Err(KinematicsError::InvalidLayout(format!(
                "max wheel speed must be positive, got {}",
                max_wheel_speed
            )));
        }
        if let Some(wheel) = wheels
            .iter()
            .find(|w| !w.angle_deg.is_finite() || !w.radial_offset.is_finite())
        {
            return Err(KinematicsError::InvalidLayout(format!(
                "wheel {} has non-finite geometry",
                wheel.name
            )));
        }
        // A unit command must map to a finite speed on every wheel
        if let Some(wheel) = wheels.iter().find(|w| {
            let gain: f64 = w.mixing_row().iter().map(|c| c.abs()).sum();
            !(gain / max_wheel_speed).is_finite()
        }) {
            return Err(KinematicsError::InvalidLayout(format!(
                "wheel {} gain overflows at full scale {}",
                wheel.name, max_wheel_speed
            )));
        }

        Ok(Self::from_parts(wheels, max_wheel_speed))
    }

    fn from_parts(wheels: Vec<WheelMount>, max_wheel_speed: f64) -> Self {
        let rows = wheels.iter().map(WheelMount::mixing_row).collect();
        Self {
            wheels,
            rows,
            max_wheel_speed,
        }
    }

    /// Four-wheel X-drive, motor order [front_left, front_right, rear_left, rear_right]
    pub fn x_drive() -> Self {
        let wheels = X_DRIVE_WHEELS
            .iter()
            .map(|&(name, angle)| WheelMount::new(name, angle, X_DRIVE_BASE_RADIUS))
            .collect();
        Self::from_parts(wheels, X_DRIVE_MAX_WHEEL_SPEED)
    }

    /// Three-wheel kiwi drive, motor order [left, back, right]
    pub fn kiwi() -> Self {
        let wheels = KIWI_WHEELS
            .iter()
            .map(|&(name, angle)| WheelMount::new(name, angle, KIWI_BASE_RADIUS))
            .collect();
        Self::from_parts(wheels, KIWI_MAX_WHEEL_SPEED)
    }

    pub fn motor_count(&self) -> usize {
        self.wheels.len()
    }

    pub fn wheel_names(&self) -> impl Iterator<Item = &str> {
        self.wheels.iter().map(|w| w.name.as_str())
    }

    pub fn mixing_row(&self, index: usize) -> Option<&[f64; 6]> {
        self.rows.get(index)
    }

    /// Stop command sized for this layout
    pub fn zero_speeds(&self) -> MotorSpeeds {
        MotorSpeeds::zero(self.motor_count())
    }

    /// Convert a twist to limited motor speeds on this layout
    pub fn compute(&self, cmd: &VelocityCommand, speed_limit: i64) -> Result<MotorSpeeds> {
        body_to_motor_speeds(self, cmd, speed_limit)
    }

    /// Normalized wheel speeds before any limiting
    pub(crate) fn unlimited_speeds(&self, cmd: &VelocityCommand) -> Vec<f64> {
        let velocity = cmd.as_array();
        self.rows
            .iter()
            .map(|row| {
                let linear_speed: f64 = row.iter().zip(velocity).map(|(c, v)| c * v).sum();
                linear_speed / self.max_wheel_speed
            })
            .collect()
    }
}

impl Default for DriveLayout {
    fn default() -> Self {
        Self::x_drive()
    }
}

/// Built-in layouts selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LayoutKind {
    #[default]
    XDrive,
    Kiwi,
}

impl LayoutKind {
    pub fn layout(self) -> DriveLayout {
        match self {
            LayoutKind::XDrive => DriveLayout::x_drive(),
            LayoutKind::Kiwi => DriveLayout::kiwi(),
        }
    }
}
