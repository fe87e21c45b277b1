/// Terminal frontend for the keycap configurator
///
/// Owns the terminal surface: the software-rasterized viewport, the swatch
/// tray bar, and the status line. All interaction (orbit drags, zoom,
/// swatch clicks, slot-count keys) funnels through the frame loop on this
/// thread; model loads complete on workers and are absorbed here between
/// frames.
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

use kc3d_core::{Camera, Configurator, OrbitState};

pub mod renderer;
pub mod ui;

pub use renderer::CellRenderer;

const TARGET_FPS: u64 = 30;

/// Main application struct for the terminal configurator
pub struct TerminalApp {
    cfg: Configurator,
    camera: Camera,
    orbit: OrbitState,
    renderer: CellRenderer,
    term_width: u16,
    term_height: u16,
    running: bool,
    framed: bool,
    drag_from: Option<(u16, u16)>,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(cfg: Configurator, auto_rotate: bool) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let viewport_h = Self::viewport_height(height, &cfg);

        let mut orbit = OrbitState::new(
            nalgebra::Point3::origin(),
            kc3d_core::camera::DEFAULT_ORBIT_RADIUS,
        );
        orbit.auto_rotate = auto_rotate;

        Ok(Self {
            camera: Camera::new(width as u32, viewport_h as u32),
            renderer: CellRenderer::new(width as usize, viewport_h as usize),
            orbit,
            cfg,
            term_width: width,
            term_height: height,
            running: true,
            framed: false,
            drag_from: None,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    fn viewport_height(term_height: u16, cfg: &Configurator) -> u16 {
        term_height.saturating_sub(ui::tray_rows(cfg.trays())).max(1)
    }

    fn tray_origin(&self) -> u16 {
        Self::viewport_height(self.term_height, &self.cfg)
    }

    /// Explicit stop handle; the frame loop exits after the current frame.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Start loading, take over the terminal, and run the frame loop.
    /// The terminal is restored even when the loop errors out.
    pub fn run(&mut self) -> io::Result<()> {
        self.cfg.begin_loading();

        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;

        let result = self.main_loop();

        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / TARGET_FPS);
        let mut prev = Instant::now();

        while self.running {
            let frame_start = Instant::now();
            let dt = (frame_start - prev).as_secs_f32().min(0.25);
            prev = frame_start;

            // Handle all pending input
            while event::poll(Duration::from_millis(0))? {
                let ev = event::read()?;
                self.handle_event(ev);
            }

            // Join finished model loads; frame the camera once the first
            // geometry arrives.
            if self.cfg.absorb_loads() > 0 && !self.framed {
                if let Some(bounds) = self.cfg.product_bounds() {
                    self.orbit.frame(&bounds);
                    self.framed = true;
                }
            }

            // Update
            self.orbit.step(dt);
            self.orbit.apply_to(&mut self.camera);

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, ev: Event) {
        match ev {
            Event::Key(KeyEvent { code, .. }) => self.handle_key(code),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.stop(),
            KeyCode::Char('w') | KeyCode::Up => self.orbit.nudge(0.0, -0.15),
            KeyCode::Char('s') | KeyCode::Down => self.orbit.nudge(0.0, 0.15),
            KeyCode::Char('a') | KeyCode::Left => self.orbit.nudge(0.15, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.orbit.nudge(-0.15, 0.0),
            KeyCode::Char('+') | KeyCode::Char('=') => self.orbit.zoom(1.0),
            KeyCode::Char('-') => self.orbit.zoom(-1.0),
            KeyCode::Char('r') => self.orbit.auto_rotate = !self.orbit.auto_rotate,
            KeyCode::Char(c @ '1'..='9') => {
                let count = c as usize - '0' as usize;
                self.cfg.on_slot_count_change(count);
                self.framed = false;
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let hit = ui::hit_test(
                    self.cfg.trays(),
                    mouse.column,
                    mouse.row,
                    self.tray_origin(),
                );
                match hit {
                    Some((tray, key)) => {
                        if let Err(e) = self.cfg.on_swatch_click(tray, key) {
                            log::warn!("swatch click failed: {e}");
                        }
                    }
                    None => self.drag_from = Some((mouse.column, mouse.row)),
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((px, py)) = self.drag_from {
                    let dx = mouse.column as f32 - px as f32;
                    let dy = mouse.row as f32 - py as f32;
                    // Dragging across the full viewport is one revolution.
                    let per_col = std::f32::consts::TAU / self.term_width.max(1) as f32;
                    let per_row = std::f32::consts::PI / self.tray_origin().max(1) as f32;
                    self.orbit.nudge(-dx * per_col, -dy * per_row);
                    self.drag_from = Some((mouse.column, mouse.row));
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.drag_from = None,
            MouseEventKind::ScrollUp => self.orbit.zoom(1.0),
            MouseEventKind::ScrollDown => self.orbit.zoom(-1.0),
            _ => {}
        }
    }

    /// Resize touches only the renderer and the camera.
    fn resize(&mut self, width: u16, height: u16) {
        self.term_width = width;
        self.term_height = height;
        let viewport_h = Self::viewport_height(height, &self.cfg);
        self.renderer.resize(width as usize, viewport_h as usize);
        self.camera.set_viewport(width as u32, viewport_h as u32);
        // Stale cells outside the new frame are not repainted otherwise.
        let _ = execute!(stdout(), terminal::Clear(terminal::ClearType::All));
    }

    fn render(&mut self) -> io::Result<()> {
        self.renderer.clear();
        for item in self.cfg.scene().draw_items() {
            self.renderer
                .render_mesh(item.mesh, &item.world, &self.camera, item.material);
        }

        let mut stdout = stdout();
        self.renderer.draw(&mut stdout, 0)?;

        ui::draw_trays(
            &mut stdout,
            self.cfg.trays(),
            self.cfg.catalog(),
            self.tray_origin(),
        )?;

        self.draw_status(&mut stdout)?;
        stdout.flush()?;
        Ok(())
    }

    fn draw_status<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let state = if self.cfg.loading() {
            "loading models…".to_string()
        } else if !self.cfg.failures().is_empty() {
            format!("{} slot(s) failed to load", self.cfg.failures().len())
        } else {
            format!("{} parts ready", self.cfg.registry().len())
        };

        queue!(
            writer,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "KC3D | FPS: {:.1} | slots: {} | {} | drag=orbit scroll=zoom 1-9=slots r=spin q=quit",
                self.fps,
                self.cfg.slot_count(),
                state
            )),
            ResetColor
        )?;
        Ok(())
    }
}
