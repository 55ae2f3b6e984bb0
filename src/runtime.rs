// Twist -> motor speed control node with watchdog
// Note: the watchdog stops the base if teleop goes quiet, otherwise the last
// motor speeds would keep the robot driving.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

// local imports
use crate::config::{Args, CMD_TIMEOUT, LOOP_HZ};
use crate::messages::{MotorSpeeds, NodeHealth, SpeedLimitUpdate, Twist};
use crate::motor::{DriveLayout, KinematicsError, VelocityCommand};

/// Transport-free state of the control node
pub struct ControlNode {
    layout: DriveLayout,
    speed_limit: i64,
    cmd_timeout: Duration,
    cmd_received_at: Option<Instant>,
    stopped: bool,
    health: NodeHealth,
}

impl ControlNode {
    pub fn new(layout: DriveLayout, speed_limit: i64) -> Self {
        Self {
            layout,
            speed_limit,
            cmd_timeout: CMD_TIMEOUT,
            cmd_received_at: None,
            stopped: false,
            health: NodeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn with_cmd_timeout(mut self, cmd_timeout: Duration) -> Self {
        self.cmd_timeout = cmd_timeout;
        self
    }

    pub fn health(&self) -> NodeHealth {
        self.health
    }

    pub fn speed_limit(&self) -> i64 {
        self.speed_limit
    }

    /// Store a new speed limit; it is validated by the converter on the next command
    pub fn set_speed_limit(&mut self, value: i64) {
        if value != self.speed_limit {
            info!("Speed limit changed: {} -> {}", self.speed_limit, value);
        }
        if value <= 0 {
            warn!("Speed limit {} is invalid, commands will be rejected", value);
        }
        self.speed_limit = value;
    }

    /// Convert an incoming twist to motor speeds using the current speed limit
    pub fn on_twist(&mut self, twist: &Twist, now: Instant) -> Result<MotorSpeeds, KinematicsError> {
        info!("Received linear x: {}", twist.linear.x);

        let cmd = VelocityCommand::from(twist);
        match self.layout.compute(&cmd, self.speed_limit) {
            Ok(speeds) => {
                debug!("Motor speeds: {:?}", speeds.as_slice());
                self.cmd_received_at = Some(now);
                self.stopped = false;
                self.health = NodeHealth::Ok;
                Ok(speeds)
            }
            Err(e) => {
                self.health = NodeHealth::InvalidCommand;
                Err(e)
            }
        }
    }

    /// Record a command payload that could not be decoded
    pub fn on_invalid_payload(&mut self) {
        self.health = NodeHealth::InvalidCommand;
    }

    /// Watchdog check, returns a stop command the first time the last command goes stale
    pub fn on_tick(&mut self, now: Instant) -> Option<MotorSpeeds> {
        let fresh = self
            .cmd_received_at
            .is_some_and(|at| now.duration_since(at) <= self.cmd_timeout);

        if fresh || self.stopped {
            return None;
        }

        // Watchdog triggered - stop the robot
        match self.cmd_received_at {
            Some(at) => warn!(
                "Command stale ({:?} old), stopping robot",
                now.duration_since(at)
            ),
            None => info!("No command received yet, holding motors at zero"),
        }
        self.stopped = true;
        self.health = NodeHealth::CmdStale;
        Some(self.layout.zero_speeds())
    }
}

pub async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let layout = args.layout.layout();
    info!(
        "Drive layout {:?}: motors [{}]",
        args.layout,
        layout.wheel_names().collect::<Vec<_>>().join(", ")
    );

    if args.speed_limit <= 0 {
        warn!(
            "Speed limit {} is invalid, commands will be rejected until it is updated",
            args.speed_limit
        );
    }
    let mut node = ControlNode::new(layout, args.speed_limit).with_cmd_timeout(args.cmd_timeout());

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let sub_input = session.declare_subscriber(args.input_topic.as_str()).await?;
    let sub_limit = session
        .declare_subscriber(args.speed_limit_topic.as_str())
        .await?;
    let pub_motors = session.declare_publisher(args.output_topic.as_str()).await?;
    let pub_health = session.declare_publisher(args.health_topic.as_str()).await?;

    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Control node started: {}Hz watchdog, {}ms timeout, speed limit {}",
        LOOP_HZ,
        args.cmd_timeout_ms,
        node.speed_limit()
    );
    info!("Subscribed to: {}, {}", args.input_topic, args.speed_limit_topic);
    info!("Publishing to: {}, {}", args.output_topic, args.health_topic);

    loop {
        tokio::select! {
            sample = sub_input.recv_async() => {
                let sample = sample?;
                let payload = sample.payload().to_bytes();
                match serde_json::from_slice::<Twist>(&payload) {
                    Ok(twist) => match node.on_twist(&twist, Instant::now()) {
                        Ok(speeds) => {
                            pub_motors.put(serde_json::to_string(&speeds)?).await?;
                        }
                        Err(e) => warn!("Dropping command: {}", e),
                    },
                    Err(e) => {
                        warn!("Failed to parse command: {}", e);
                        node.on_invalid_payload();
                    }
                }
            }

            sample = sub_limit.recv_async() => {
                let sample = sample?;
                let payload = sample.payload().to_bytes();
                match serde_json::from_slice::<SpeedLimitUpdate>(&payload) {
                    Ok(update) => node.set_speed_limit(update.value),
                    Err(e) => warn!("Failed to parse speed limit update: {}", e),
                }
            }

            _ = tick.tick() => {
                if let Some(stop) = node.on_tick(Instant::now()) {
                    pub_motors.put(serde_json::to_string(&stop)?).await?;
                }

                let health_json = serde_json::to_string(&node.health())?;
                pub_health.put(health_json).await?;
            }
        }
    }
}
