use crate::config::Config;
use crate::render::{draw_particle, CellGrid, TrailCanvas, SCALE, SUB_H, SUB_W};
use crate::sim::Simulation;
use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    io::{self, Stdout, Write},
    time::{Duration, Instant},
};

pub(crate) fn run(cfg: Config) -> Result<()> {
    let mut out = io::stdout();

    // Flicker-safe setup
    execute!(out, EnterAlternateScreen, cursor::Hide, DisableLineWrap)?;
    terminal::enable_raw_mode()?;

    let res = frame_loop(&mut out, &cfg);

    terminal::disable_raw_mode().ok();
    execute!(
        out,
        ResetColor,
        EnableLineWrap,
        cursor::Show,
        LeaveAlternateScreen
    )
    .ok();

    res
}

fn frame_loop(out: &mut Stdout, cfg: &Config) -> Result<()> {
    let mut rng = if cfg.seed != 0 {
        StdRng::seed_from_u64(cfg.seed)
    } else {
        StdRng::from_entropy()
    };
    let mut sim = Simulation::seed(&mut rng, cfg.particles);

    let mut last_size = (0u16, 0u16);
    let mut w_cells: usize = 0;
    let mut h_cells: usize = 0;
    let mut canvas = TrailCanvas::new(0, 0);
    let mut cells = CellGrid::new(0, 0);

    let mut fps_smooth = cfg.fps as f32;
    let mut last = Instant::now();

    execute!(out, Clear(ClearType::All))?;

    loop {
        // Input: quit only
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(k) = event::read()? {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
                match k.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if ctrl => return Ok(()),
                    _ => {}
                }
            }
        }

        let frame_start = Instant::now();
        let dt = (frame_start - last).as_secs_f32();
        last = frame_start;
        fps_smooth = fps_smooth * 0.9 + (1.0 / dt.max(1e-6)) * 0.1;

        // Surface geometry is re-read every frame; a resize rebuilds the
        // trail buffers from scratch.
        let (tw, th) = terminal::size()?;
        if (tw, th) != last_size {
            last_size = (tw, th);
            w_cells = tw.max(10) as usize;
            h_cells = th.saturating_sub(1).max(6) as usize;
            canvas.resize(w_cells * SUB_W, h_cells * SUB_H);
            cells.resize(w_cells, h_cells);
            execute!(out, Clear(ClearType::All))?;
        }

        canvas.fade();
        sim.step();
        for p in &sim.particles {
            draw_particle(&mut canvas, p, SCALE);
        }

        queue!(out, BeginSynchronizedUpdate)?;
        cells.draw(out, &canvas)?;

        let hud = format!(
            "lorenzfield | particles {} | seed {} | fps {:.0} | planes xy xz yz | Q quit",
            sim.particles.len(),
            cfg.seed,
            fps_smooth,
        );
        queue!(
            out,
            cursor::MoveTo(0, h_cells as u16),
            SetForegroundColor(Color::DarkGrey),
            Print(pad_to(&hud, w_cells)),
            ResetColor
        )?;

        queue!(out, EndSynchronizedUpdate)?;
        out.flush()?;

        sleep_to_cap(frame_start, cfg.fps);
    }
}

fn pad_to(s: &str, w: usize) -> String {
    if s.chars().count() >= w {
        s.chars().take(w).collect()
    } else {
        let mut out = String::with_capacity(w);
        out.push_str(s);
        let n = w - s.chars().count();
        for _ in 0..n {
            out.push(' ');
        }
        out
    }
}

fn sleep_to_cap(frame_start: Instant, fps: u64) {
    let frame_ms = 1000 / fps.max(1);
    let elapsed_ms = frame_start.elapsed().as_millis() as u64;
    if elapsed_ms < frame_ms {
        std::thread::sleep(Duration::from_millis(frame_ms - elapsed_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_to_truncates_and_pads() {
        assert_eq!(pad_to("abc", 5), "abc  ");
        assert_eq!(pad_to("abcdef", 4), "abcd");
    }
}
