use clap::Parser;
use core::cell::RefCell;
use embedded_graphics::{pixelcolor::Rgb565, prelude::*, Pixel};
use embedded_hal::{
    delay::DelayNs,
    i2c::{ErrorKind, ErrorType, I2c, Operation},
};
use rover_core::utils::{
    controllers::servo::ServoDrive, packet, Command, Link, RobotConfig, RobotController,
};
use smart_leds_trait::{SmartLedsWrite, RGB8};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Lines},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};
use tracing::{debug, error, info, trace, warn};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// Command script to replay (stdin if omitted)
    #[clap(long)]
    script: Option<PathBuf>,
    /// JSON robot configuration
    #[clap(long)]
    config: Option<PathBuf>,
    /// skip real sleeping (emergency-stop hold, re-advertise back-off)
    #[clap(long)]
    fast: bool,
}

/// LED chain that logs to console.
struct ConsoleLeds {
    name: &'static str,
}

impl SmartLedsWrite for ConsoleLeds {
    type Error = ErrorKind;
    type Color = RGB8;

    fn write<T, I>(
        &mut self,
        iterator: T,
    ) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        for (index, color) in iterator.into_iter().map(Into::into).enumerate() {
            info!(leds = self.name, index, r = color.r, g = color.g, b = color.b, "LED");
        }
        Ok(())
    }
}

/// I2C bus that accepts every transfer and traces writes.
struct ConsoleI2c;

impl ErrorType for ConsoleI2c {
    type Error = ErrorKind;
}

impl I2c for ConsoleI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => trace!(address, ?bytes, "i2c write"),
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

/// 240×240 canvas that only counts what gets drawn.
struct ConsoleCanvas {
    ink: usize,
}

impl OriginDimensions for ConsoleCanvas {
    fn size(&self) -> Size {
        Size::new(240, 240)
    }
}

impl DrawTarget for ConsoleCanvas {
    type Color = Rgb565;
    type Error = ErrorKind;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(_, color) in pixels {
            if color == Rgb565::BLACK {
                self.ink += 1;
            }
        }
        debug!(ink = self.ink, "canvas");
        Ok(())
    }

    fn clear(
        &mut self,
        _color: Self::Color,
    ) -> Result<(), Self::Error> {
        self.ink = 0;
        Ok(())
    }
}

/// Blocking delay backed by the OS scheduler.
struct HostDelay {
    fast: bool,
}

impl DelayNs for HostDelay {
    fn delay_ns(
        &mut self,
        ns: u32,
    ) {
        if self.fast {
            debug!(ms = ns / 1_000_000, "delay skipped");
        } else {
            std::thread::sleep(Duration::from_nanos(ns.into()));
        }
    }
}

enum ScriptEvent {
    Connect,
    Disconnect,
    Frame(Vec<u8>),
}

/// Simulated central replaying a line-based script.
///
/// Lines are `connect`, `disconnect`, `raw <hex bytes>`, or a JSON command
/// such as `{"button_event":{"button":"up","pressed":true}}`. Blank lines and
/// lines starting with `#` are skipped.
struct ScriptLink {
    lines: Lines<Box<dyn BufRead>>,
    connected: bool,
    finished: bool,
}

impl ScriptLink {
    fn new(input: Box<dyn BufRead>) -> Self {
        Self {
            lines: input.lines(),
            connected: false,
            finished: false,
        }
    }

    fn next_event(&mut self) -> Option<ScriptEvent> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    error!("script read failed: {:?}", e);
                    return None;
                }
            };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Some(event) => return Some(event),
                None => warn!(line, "unrecognized script line"),
            }
        }
    }
}

fn parse_line(line: &str) -> Option<ScriptEvent> {
    match line {
        "connect" => return Some(ScriptEvent::Connect),
        "disconnect" => return Some(ScriptEvent::Disconnect),
        _ => {}
    }
    if let Some(hex) = line.strip_prefix("raw ") {
        let bytes = hex
            .split_whitespace()
            .map(|tok| u8::from_str_radix(tok, 16))
            .collect::<Result<Vec<u8>, _>>()
            .ok()?;
        return Some(ScriptEvent::Frame(bytes));
    }
    let command: Command = serde_json::from_str(line).ok()?;
    Some(ScriptEvent::Frame(packet::encode(&command).as_bytes().to_vec()))
}

impl Link for ScriptLink {
    fn start_advertising(&mut self) {
        info!("advertising");
    }

    fn stop_advertising(&mut self) {
        info!("advertising stopped");
    }

    fn wait_for_connection(&mut self) {
        loop {
            match self.next_event() {
                Some(ScriptEvent::Connect) => {
                    self.connected = true;
                    return;
                }
                Some(ScriptEvent::Frame(_)) => warn!("no central connected, frame lost"),
                Some(ScriptEvent::Disconnect) => {}
                None => {
                    self.finished = true;
                    return;
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn next_message(
        &mut self,
        buf: &mut [u8],
    ) -> Option<usize> {
        loop {
            match self.next_event() {
                Some(ScriptEvent::Frame(bytes)) => {
                    let len = bytes.len().min(buf.len());
                    buf[..len].copy_from_slice(&bytes[..len]);
                    return Some(len);
                }
                Some(ScriptEvent::Connect) => {}
                Some(ScriptEvent::Disconnect) => {
                    self.connected = false;
                    return None;
                }
                None => {
                    self.connected = false;
                    self.finished = true;
                    return None;
                }
            }
        }
    }

    fn discard_pending(&mut self) -> usize {
        // Lines are read on demand, so nothing queues up behind a hold.
        0
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RobotConfig, String> {
    let Some(path) = path else {
        return Ok(RobotConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let opts: Opts = Opts::parse();
    let config = match load_config(opts.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            error!("config load failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let input: Box<dyn BufRead> = match &opts.script {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                error!("cannot open {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdin().lock()),
    };
    let mut link = ScriptLink::new(input);

    let i2c_bus = RefCell::new(ConsoleI2c);
    let mut servos = match ServoDrive::new(&i2c_bus, config.servo.clone()) {
        Ok(servos) => servos,
        Err(e) => {
            error!("servo init failed: {:?}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = servos.configure() {
        error!("servo configure failed: {:?}", e);
        return ExitCode::FAILURE;
    }

    let mut robot = RobotController::new(
        servos,
        ConsoleLeds { name: "underglow" },
        ConsoleLeds { name: "status" },
        ConsoleCanvas { ink: 0 },
        HostDelay { fast: opts.fast },
        &config,
    );

    if let Err(e) = robot.start() {
        error!("robot start failed: {:?}", e);
        return ExitCode::FAILURE;
    }
    while !link.finished {
        if let Err(e) = robot.run_session(&mut link) {
            error!("robot halted: {:?}", e);
            return ExitCode::FAILURE;
        }
    }
    info!(state = ?robot.state(), "script finished");
    ExitCode::SUCCESS
}
