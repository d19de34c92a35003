// main.rs      gifplay command
//
// Copyright (c) 2025  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gifplay::{
    frame_delay, Config, DisposalMode, FrameRecord, GifResource, Scheduler,
    Sink, Viewport, Window,
};
use log::info;
use std::error::Error;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Default display size (pixels; two pixels per terminal row)
const DISPLAY_SIZE: &str = "80x48";

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Always);
    match create_app().get_matches().subcommand() {
        ("show", Some(matches)) => show(&mut out, matches)?,
        ("play", Some(matches)) => play(&mut out, matches)?,
        _ => unreachable!("subcommand required"),
    }
    out.reset()?;
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("gifplay")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("GIF animation player")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("show")
                .about("Show GIF frame table")
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input file(s)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("play")
                .about("Play a GIF in the terminal")
                .arg(Arg::with_name("file").required(true).help("input file"))
                .arg(
                    Arg::with_name("loops")
                        .long("loops")
                        .takes_value(true)
                        .help("passes to play (negative: forever, 0: one frame)"),
                )
                .arg(
                    Arg::with_name("transparent")
                        .long("transparent")
                        .help("enable transparency compositing"),
                )
                .arg(
                    Arg::with_name("min-delay")
                        .long("min-delay")
                        .takes_value(true)
                        .help("delay for zero-delay frames (ms)"),
                )
                .arg(
                    Arg::with_name("disposal")
                        .long("disposal")
                        .takes_value(true)
                        .possible_values(&["0", "1", "2", "3"])
                        .help("override disposal mode of every frame"),
                )
                .arg(
                    Arg::with_name("size")
                        .long("size")
                        .takes_value(true)
                        .default_value(DISPLAY_SIZE)
                        .help("display size in pixels (WxH)"),
                ),
        )
}

/// Handle show subcommand
fn show(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    if let Some(values) = matches.values_of_os("files") {
        for path in values {
            show_file(out, path)?;
        }
    }
    Ok(())
}

/// Show one GIF file
fn show_file(
    out: &mut StandardStream,
    path: &OsStr,
) -> Result<(), Box<dyn Error>> {
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut red = ColorSpec::new();
    red.set_fg(Some(Color::Red)).set_intense(true);
    let mut yellow = ColorSpec::new();
    yellow.set_fg(Some(Color::Yellow)).set_intense(true);
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    out.set_color(&magenta)?;
    writeln!(out, "{:?}", path)?;
    let f = BufReader::new(File::open(path)?);
    let config = Config::default();
    let res = match GifResource::load(f, config) {
        Ok(res) => res,
        Err(e) => {
            out.set_color(&red)?;
            writeln!(out, "{e} ({:?})", e.kind())?;
            return Ok(());
        }
    };
    let width = res.screen_width();
    let height = res.screen_height();
    let frame_digits = digits(res.frame_count()).max(3);
    let size_digits = 4.max(1 + digits(width) + digits(height));
    out.set_color(&bold)?;
    write!(out, "{width}x{height}, frames: {}", res.frame_count())?;
    if let Some(c) = res.loop_count() {
        write!(out, ", repeat: ")?;
        if c == 0 {
            write!(out, "∞")?;
        } else {
            write!(out, "{c}")?;
        }
    }
    writeln!(out, ", raster: {} bytes", res.raster_volume())?;
    out.set_color(&yellow)?;
    write!(out, " {:>w$}", "Fr#", w = frame_digits)?;
    write!(out, "  Delay Disp")?;
    write!(out, " {:>w$}", "Size", w = size_digits)?;
    write!(out, " {:>w$}", "X,Y", w = size_digits)?;
    writeln!(out, " Clrs Trn")?;
    let global_clr = res.global_color_table().map_or(0, |t| t.len());
    for (number, frame) in res.frames().iter().enumerate() {
        let row = FrameRow {
            frame,
            config: res.config(),
            width,
            height,
            global_clr,
            number,
            frame_digits,
            size_digits,
        };
        row.show(out)?;
    }
    Ok(())
}

/// One row of the frame table
struct FrameRow<'a> {
    frame: &'a FrameRecord,
    config: &'a Config,
    width: u16,
    height: u16,
    global_clr: usize,
    number: usize,
    frame_digits: usize,
    size_digits: usize,
}

impl FrameRow<'_> {
    /// Show one frame of a GIF file
    fn show(&self, out: &mut StandardStream) -> Result<(), Box<dyn Error>> {
        let frame = self.frame;
        let mut dflt = ColorSpec::new();
        dflt.set_fg(Some(Color::White));
        let mut bold = ColorSpec::new();
        bold.set_fg(Some(Color::White))
            .set_intense(true)
            .set_bold(true);
        let mut red = ColorSpec::new();
        red.set_fg(Some(Color::Red)).set_intense(true);
        out.set_color(&bold)?;
        write!(out, " {:>w$}", self.number, w = self.frame_digits)?;
        let ms = frame_delay(frame, self.config).as_millis();
        if frame.delay_time_cs() == 0 {
            // substituted delay
            out.set_color(&red)?;
        } else {
            out.set_color(&dflt)?;
        }
        write!(out, " {:>4}ms", ms)?;
        let d = match frame.disposal() {
            DisposalMode::None => "none",
            DisposalMode::Leave => "keep",
            DisposalMode::ToBackground => "bg",
            DisposalMode::RestorePrevious => "prev",
        };
        out.set_color(if d == "none" { &dflt } else { &bold })?;
        write!(out, " {:>4}", d)?;
        if self.width == frame.width() && self.height == frame.height() {
            out.set_color(&dflt)?;
        } else {
            out.set_color(&bold)?;
        }
        write!(
            out,
            " {:>w$}",
            &format!("{}x{}", frame.width(), frame.height()),
            w = self.size_digits
        )?;
        if frame.left() == 0 && frame.top() == 0 {
            out.set_color(&dflt)?;
        } else {
            out.set_color(&bold)?;
        }
        write!(
            out,
            " {:>w$}",
            &format!("{},{}", frame.left(), frame.top()),
            w = self.size_digits
        )?;
        match frame.local_color_table() {
            Some(tbl) => {
                out.set_color(&bold)?;
                write!(out, "  {:3}", tbl.len())?;
            }
            None => {
                out.set_color(&dflt)?;
                write!(out, " {:3}g", self.global_clr)?;
            }
        }
        match frame.transparent_color() {
            Some(tc) => {
                out.set_color(&bold)?;
                writeln!(out, " {:>3}", tc)?;
            }
            None => {
                out.set_color(&dflt)?;
                writeln!(out, " {:>3}", "-")?;
            }
        }
        Ok(())
    }
}

/// Handle play subcommand
fn play(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let path = matches.value_of_os("file").ok_or("missing file")?;
    let loops = match matches.value_of("loops") {
        Some(v) => v.parse::<i32>()?,
        None => 1,
    };
    let mut config =
        Config::default().with_transparency(matches.is_present("transparent"));
    if let Some(ms) = matches.value_of("min-delay") {
        config = config.with_min_delay_ms(ms.parse::<u32>()?);
    }
    if let Some(d) = matches.value_of("disposal") {
        let disposal = DisposalMode::from(d.parse::<u8>()?);
        config = config.with_disposal_override(Some(disposal));
    }
    let (display_width, display_height) =
        parse_size(matches.value_of("size").unwrap_or(DISPLAY_SIZE))?;
    let f = BufReader::new(File::open(path)?);
    let mut res = GifResource::load(f, config)?;
    res.set_viewport(Viewport::centered(
        u32::from(res.screen_width()),
        u32::from(res.screen_height()),
        display_width,
        display_height,
    ));
    info!("playing {:?}: {} frames, {loops} loops", path, res.frame_count());
    let mut sink = TermSink::new(out);
    let result = Scheduler::new().run(&mut res, &mut sink, loops);
    res.release();
    result?;
    Ok(())
}

/// Parse a display size (WxH)
fn parse_size(size: &str) -> Result<(u32, u32), Box<dyn Error>> {
    let (w, h) = size.split_once('x').ok_or("size must be WxH")?;
    Ok((w.parse::<u32>()?, h.parse::<u32>()?))
}

/// Sink drawing windows with truecolor half blocks
struct TermSink<'a> {
    out: &'a mut StandardStream,
    /// Terminal rows drawn by the previous frame
    rows: u32,
}

impl<'a> TermSink<'a> {
    fn new(out: &'a mut StandardStream) -> Self {
        TermSink { out, rows: 0 }
    }
}

/// Get terminal color of an RGBA pixel
fn term_color(rgba: [u8; 4]) -> Option<Color> {
    let [r, g, b, a] = rgba;
    (a > 0).then_some(Color::Rgb(r, g, b))
}

impl Sink for TermSink<'_> {
    fn present(&mut self, window: &Window<'_>) -> gifplay::Result<()> {
        if self.rows > 0 {
            write!(self.out, "\x1b[{}A\r", self.rows)?;
        }
        let top = window.dest_y() / 2;
        for _ in 0..top {
            writeln!(self.out)?;
        }
        let indent = " ".repeat(window.dest_x() as usize);
        let mut spec = ColorSpec::new();
        for y in (0..window.height()).step_by(2) {
            write!(self.out, "{indent}")?;
            for x in 0..window.width() {
                let upper = term_color(window.rgba(x, y));
                let lower = if y + 1 < window.height() {
                    term_color(window.rgba(x, y + 1))
                } else {
                    None
                };
                spec.set_fg(upper).set_bg(lower);
                self.out.set_color(&spec)?;
                write!(self.out, "▀")?;
            }
            self.out.reset()?;
            writeln!(self.out)?;
        }
        self.out.flush()?;
        self.rows = top + (window.height() + 1) / 2;
        Ok(())
    }
}

/// Calculate digits in a number
fn digits<T: Into<usize>>(v: T) -> usize {
    let v = v.into();
    match v {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1000..=9999 => 4,
        _ => 5,
    }
}
