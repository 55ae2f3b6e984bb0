// Keyboard teleop for the control node
// WASD strafe/drive, Z/X yaw, R/F speed step, 1-4 speed limiter, Q quit
//
// Usage: cargo run --example teleop
use blueshift_control::config::{TOPIC_INPUT, TOPIC_SPEED_LIMIT};
use blueshift_control::messages::{SpeedLimitUpdate, Twist};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

const SPEEDS: [f64; 3] = [0.1, 0.3, 0.6]; // m/s
const YAW_SPEEDS: [f64; 3] = [0.3, 0.8, 1.6]; // rad/s
const SPEED_LABELS: [&str; 3] = ["LOW", "MED", "HIGH"];
const HOLD_TIMEOUT: Duration = Duration::from_millis(100); // twist zeroes after this long without a key
const PUBLISH_PERIOD: Duration = Duration::from_millis(20);

enum KeyAction {
    None,
    SpeedLimit(i64),
    Quit,
}

struct Teleop {
    twist: Twist,
    step: usize,
    last_motion_key: Instant,
}

impl Teleop {
    fn new() -> Self {
        Self {
            twist: Twist::default(),
            step: 0,
            last_motion_key: Instant::now(),
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> KeyAction {
        let (linear, yaw) = (SPEEDS[self.step], YAW_SPEEDS[self.step]);
        let target = match code {
            KeyCode::Char('w') => Some((&mut self.twist.linear.x, linear)),
            KeyCode::Char('s') => Some((&mut self.twist.linear.x, -linear)),
            KeyCode::Char('a') => Some((&mut self.twist.linear.y, linear)),
            KeyCode::Char('d') => Some((&mut self.twist.linear.y, -linear)),
            KeyCode::Char('z') => Some((&mut self.twist.angular.z, yaw)),
            KeyCode::Char('x') => Some((&mut self.twist.angular.z, -yaw)),
            _ => None,
        };
        if let Some((axis, value)) = target {
            *axis = value;
            self.last_motion_key = Instant::now();
            return KeyAction::None;
        }

        match code {
            KeyCode::Char('r') => self.shift_step(1),
            KeyCode::Char('f') => self.shift_step(-1),
            KeyCode::Char(c @ '1'..='4') => return KeyAction::SpeedLimit(i64::from(c as u8 - b'0')),
            KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
            _ => {}
        }
        KeyAction::None
    }

    fn shift_step(&mut self, delta: isize) {
        self.step = self.step.saturating_add_signed(delta).min(SPEEDS.len() - 1);
        info!("Speed: {}", SPEED_LABELS[self.step]);
    }

    /// Twist to publish now, zeroed once keys have been released
    fn current(&mut self) -> Twist {
        if self.last_motion_key.elapsed() > HOLD_TIMEOUT {
            self.twist = Twist::default();
        }
        self.twist
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let pub_twist = session.declare_publisher(TOPIC_INPUT).await?;
    let pub_limit = session.declare_publisher(TOPIC_SPEED_LIMIT).await?;

    info!("Controls: WASD=move, Z/X=rotate, R/F=speed, 1-4=speed limiter, Q=quit");
    info!("Speed: {}", SPEED_LABELS[0]);

    enable_raw_mode()?;
    let result = drive(&pub_twist, &pub_limit).await;
    disable_raw_mode()?;

    result
}

async fn drive(
    pub_twist: &zenoh::pubsub::Publisher<'_>,
    pub_limit: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut teleop = Teleop::new();

    loop {
        if event::poll(PUBLISH_PERIOD)? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()?
                && matches!(kind, KeyEventKind::Press | KeyEventKind::Repeat)
            {
                match teleop.handle_key(code) {
                    KeyAction::Quit => break,
                    KeyAction::SpeedLimit(value) => {
                        info!("Speed limiter: {}", value);
                        let update = serde_json::to_string(&SpeedLimitUpdate { value })?;
                        pub_limit.put(update).await?;
                    }
                    KeyAction::None => {}
                }
            }
        }

        pub_twist.put(serde_json::to_string(&teleop.current())?).await?;
    }

    Ok(())
}
