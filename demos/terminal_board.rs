//! Terminal page board
//!
//! Drag blocks with the left mouse button, or grab a block's bottom-right
//! cell to resize it. Blocks you land on are pushed down live.
//!
//! ```bash
//! cargo run --example terminal_board
//! BLOCKGRID_LOG=/tmp/blockgrid.log cargo run --example terminal_board
//! ```
//!
//! Keys:
//! * `Esc` cancels the gesture in progress
//! * `q` / `Ctrl+C` exits

use std::io::{self, Write};

use blockgrid::{
    Block, ControllerConfig, DriverOutput, FileSink, GridConfig, GridPosition,
    InteractionController, Layout, LayoutRenderer, Logger, RendererSettings, SessionOutcome,
    TerminalPointerAdapter,
};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};

const HEADER_LINES: u16 = 2;
const LOG_BYTES: u64 = 256 * 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = RendererSettings {
        cell_width: 5,
        row_lines: 1,
        ..RendererSettings::default()
    };
    let grid = GridConfig {
        row_height_px: f64::from(settings.row_lines),
        ..GridConfig::default()
    };
    let surface_width = f64::from(grid.columns) * f64::from(settings.cell_width);

    let mut config = ControllerConfig::with_grid(grid.clone()).with_surface_width(surface_width);
    let mut adapter = TerminalPointerAdapter::new(0, HEADER_LINES);
    if let Ok(path) = std::env::var("BLOCKGRID_LOG") {
        let logger = Logger::new(FileSink::new(path, LOG_BYTES)?);
        config = config.with_logger(logger.clone());
        config.enable_metrics();
        adapter = adapter.with_logger(logger);
    }

    let mut controller = InteractionController::new(starter_page(&grid)?, config)?;
    let renderer = LayoutRenderer::new(settings);

    let mut stdout = io::stdout();
    enter(&mut stdout)?;
    let result = run(&mut stdout, &mut controller, &mut adapter, &renderer, grid.columns);
    exit(&mut stdout);
    result
}

fn starter_page(grid: &GridConfig) -> blockgrid::Result<Layout> {
    let blocks = [
        ("hero", "banner", GridPosition::new(0, 0, 12, 2)),
        ("news", "list", GridPosition::new(0, 2, 6, 3)),
        ("stats", "chart", GridPosition::new(6, 2, 6, 2)),
        ("links", "list", GridPosition::new(6, 4, 3, 2)),
        ("notes", "text", GridPosition::new(9, 4, 3, 2)),
        ("footer", "text", GridPosition::new(0, 6, 12, 2)),
    ];
    Layout::from_blocks(
        blocks
            .into_iter()
            .map(|(id, kind, position)| Block::new(id, kind.to_string(), position))
            .collect(),
        grid,
    )
}

fn run(
    stdout: &mut impl Write,
    controller: &mut InteractionController,
    adapter: &mut TerminalPointerAdapter,
    renderer: &LayoutRenderer,
    columns: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut status = String::from("drag a block; grab its bottom-right cell to resize");
    draw(stdout, controller.preview(), renderer, columns, &status)?;

    loop {
        let event = event::read()?;
        if is_quit(&event) {
            return Ok(());
        }

        let Some(output) = adapter.handle_event(controller, &event)? else {
            continue;
        };

        status = match &output {
            DriverOutput::Preview(frame) => match frame.message() {
                Some(message) => format!("{} -> {}", frame.position, message),
                None => format!("{} ok", frame.position),
            },
            DriverOutput::Finished(SessionOutcome::Committed { block_id, moves, .. }) => {
                format!("{block_id} committed, {} block(s) moved", moves.len())
            }
            DriverOutput::Finished(SessionOutcome::Cancelled {
                block_id, reason, ..
            }) => format!("{block_id} cancelled: {reason}"),
            DriverOutput::Resized { .. } => status,
        };
        draw(stdout, controller.preview(), renderer, columns, &status)?;
    }
}

fn is_quit(event: &Event) -> bool {
    match event {
        Event::Key(KeyEvent {
            code: KeyCode::Char('q'),
            kind: KeyEventKind::Press,
            ..
        }) => true,
        Event::Key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn draw(
    stdout: &mut impl Write,
    layout: &Layout,
    renderer: &LayoutRenderer,
    columns: i32,
    status: &str,
) -> io::Result<()> {
    queue!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
    write!(stdout, "blockgrid board  (q quits, esc cancels)")?;
    queue!(stdout, MoveTo(0, 1))?;
    write!(stdout, "{status}")?;

    for (offset, line) in renderer.render_lines(layout, columns).iter().enumerate() {
        let row = HEADER_LINES.saturating_add(u16::try_from(offset).unwrap_or(u16::MAX));
        queue!(stdout, MoveTo(0, row))?;
        write!(stdout, "{line}")?;
    }
    stdout.flush()
}

fn enter(stdout: &mut impl Write) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        Hide,
        Clear(ClearType::All)
    )
}

fn exit(stdout: &mut impl Write) {
    execute!(
        stdout,
        Show,
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )
    .ok();
    terminal::disable_raw_mode().ok();
}
