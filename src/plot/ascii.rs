//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - series line: `*` at samples, `-` between them; NaN samples break the line
//! - optional marker: `|` column at a highlighted stamp (e.g. an epoch)

use chrono::NaiveDateTime;

use crate::io::ingest::format_timestamp;
use crate::series::ScadaSeries;

/// Render `series` into a `width` x `height` character grid.
pub fn render_series_plot(
    series: &ScadaSeries,
    width: usize,
    height: usize,
    marker: Option<NaiveDateTime>,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((t_min, t_max)) = time_range(series) else {
        return format!("Plot: '{}' has no samples\n", series.name());
    };
    let (y_min, y_max) = y_range(series).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    if let Some(m) = marker.filter(|m| (t_min..=t_max).contains(&(m.and_utc().timestamp() as f64))) {
        let x = map_x(m.and_utc().timestamp() as f64, t_min, t_max, width);
        for row in grid.iter_mut() {
            row[x] = '|';
        }
    }

    let mut prev: Option<(usize, usize)> = None;
    for &(t, v) in series.points() {
        if !v.is_finite() {
            prev = None;
            continue;
        }
        let x = map_x(t.and_utc().timestamp() as f64, t_min, t_max, width);
        let y = map_y(v, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(&mut grid, x0, y0, x, y, '-');
        }
        prev = Some((x, y));
    }

    // Sample markers go last so line segments never hide them.
    for &(t, v) in series.points() {
        if v.is_finite() {
            let x = map_x(t.and_utc().timestamp() as f64, t_min, t_max, width);
            grid[map_y(v, y_min, y_max, height)][x] = '*';
        }
    }

    let (start, end) = match (series.first(), series.last()) {
        (Some((s, _)), Some((e, _))) => (format_timestamp(s), format_timestamp(e)),
        _ => (String::new(), String::new()),
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | {start} .. {end} | y=[{y_min:.2}, {y_max:.2}]\n",
        series.name()
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn time_range(series: &ScadaSeries) -> Option<(f64, f64)> {
    let (first, _) = series.first()?;
    let (last, _) = series.last()?;
    let t_min = first.and_utc().timestamp() as f64;
    let mut t_max = last.and_utc().timestamp() as f64;
    if t_max <= t_min {
        t_max = t_min + 1.0;
    }
    Some((t_min, t_max))
}

fn y_range(series: &ScadaSeries) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for v in series.values().filter(|v| v.is_finite()) {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        Some((min_y - 0.5, min_y + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
