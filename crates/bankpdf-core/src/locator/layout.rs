//! Table detection from positioned text
//!
//! Runs are grouped into visual lines, neighbouring runs within a line are
//! merged into cell fragments, and stretches of lines with two or more
//! fragments become tables. The first line of a table is its header; the
//! header fragments define the column spans every later line is cut into.

use crate::grid::Grid;

use super::content::TextRun;
use super::LocatorSettings;

/// Neighbouring runs on one line that read as a single cell
#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    x0: f64,
    x1: f64,
    text: String,
}

impl Fragment {
    fn center(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }
}

#[derive(Debug, Clone)]
struct Line {
    y: f64,
    font_size: f64,
    fragments: Vec<Fragment>,
}

impl Line {
    fn is_tabular(&self) -> bool {
        self.fragments.len() >= 2
    }
}

/// Cluster runs into lines, top of the page first
fn group_lines(runs: &[TextRun], settings: &LocatorSettings) -> Vec<Line> {
    let mut sorted: Vec<&TextRun> = runs.iter().filter(|r| !r.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut clusters: Vec<(f64, Vec<&TextRun>)> = Vec::new();
    for run in sorted {
        let tolerance = settings.line_tolerance.max(run.font_size * 0.3);
        match clusters.last_mut() {
            Some((y, members)) if (*y - run.y).abs() <= tolerance => members.push(run),
            _ => clusters.push((run.y, vec![run])),
        }
    }

    clusters
        .into_iter()
        .map(|(y, mut members)| {
            members.sort_by(|a, b| a.x.total_cmp(&b.x));
            let font_size = members.iter().map(|r| r.font_size).fold(0.0, f64::max);
            Line {
                y,
                font_size,
                fragments: merge_fragments(&members, settings),
            }
        })
        .collect()
}

/// Join runs separated by less than `fragment_gap` font sizes
fn merge_fragments(runs: &[&TextRun], settings: &LocatorSettings) -> Vec<Fragment> {
    let mut fragments: Vec<Fragment> = Vec::new();
    for run in runs {
        let text = run.text.trim();
        let gap_limit = settings.fragment_gap * run.font_size.max(1.0);
        match fragments.last_mut() {
            Some(frag) if run.x - frag.x1 <= gap_limit => {
                if run.x - frag.x1 > run.font_size * 0.15 || run.text.starts_with(' ') {
                    frag.text.push(' ');
                }
                frag.text.push_str(text);
                frag.x1 = frag.x1.max(run.x1());
            }
            _ => fragments.push(Fragment {
                x0: run.x,
                x1: run.x1(),
                text: text.to_string(),
            }),
        }
    }
    fragments
}

/// Split lines into blocks of tabular lines
fn find_blocks(lines: Vec<Line>, settings: &LocatorSettings) -> Vec<Vec<Line>> {
    let mut blocks = Vec::new();
    let mut current: Vec<Line> = Vec::new();
    let mut pending: Vec<Line> = Vec::new();

    for line in lines {
        if !line.is_tabular() {
            if !current.is_empty() {
                pending.push(line);
                if pending.len() > settings.max_interruptions {
                    blocks.push(std::mem::take(&mut current));
                    pending.clear();
                }
            }
            continue;
        }

        if let Some(first) = current.first() {
            let previous_y = pending.last().or(current.last()).map_or(line.y, |l| l.y);
            let too_far = previous_y - line.y > settings.max_row_gap * line.font_size.max(1.0);
            // A line much wider than the current header starts a new table,
            // e.g. the transaction header right below a two-column info box.
            let new_header = line.fragments.len() >= 3
                && line.fragments.len() >= first.fragments.len() + 2;
            if too_far || new_header {
                blocks.push(std::mem::take(&mut current));
                pending.clear();
            } else {
                current.append(&mut pending);
            }
        }
        current.push(line);
    }

    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Column for a fragment: largest horizontal overlap, else nearest centre
fn column_for(fragment: &Fragment, columns: &[Fragment]) -> usize {
    let overlap = |c: &Fragment| fragment.x1.min(c.x1) - fragment.x0.max(c.x0);
    let best = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (i, overlap(c)))
        .filter(|(_, o)| *o > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((i, _)) = best {
        return i;
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (a.center() - fragment.center())
                .abs()
                .total_cmp(&(b.center() - fragment.center()).abs())
        })
        .map_or(0, |(i, _)| i)
}

fn block_to_grid(block: Vec<Line>, settings: &LocatorSettings) -> Grid {
    let mut lines = block.into_iter();
    let Some(header) = lines.next() else {
        return Grid::default();
    };
    let columns = header.fragments;

    let mut rows: Vec<Vec<String>> = vec![columns.iter().map(|c| c.text.clone()).collect()];
    for line in lines {
        let mut cells = vec![String::new(); columns.len()];
        for fragment in &line.fragments {
            let cell = &mut cells[column_for(fragment, &columns)];
            if !cell.is_empty() {
                cell.push(' ');
            }
            cell.push_str(&fragment.text);
        }

        // Wrapped cell text: a lone fragment outside the first column
        // continues the row above.
        let continuation = settings.merge_continuation_lines
            && rows.len() > 1
            && line.fragments.len() == 1
            && cells[0].is_empty();
        if continuation {
            if let Some(previous) = rows.last_mut() {
                for (prev, extra) in previous.iter_mut().zip(cells) {
                    if !extra.is_empty() {
                        if !prev.is_empty() {
                            prev.push(' ');
                        }
                        prev.push_str(&extra);
                    }
                }
            }
            continue;
        }
        rows.push(cells);
    }

    Grid::new(rows)
}

/// Detect the tables on one page from its text runs
pub fn grids_from_runs(runs: &[TextRun], settings: &LocatorSettings) -> Vec<Grid> {
    let lines = group_lines(runs, settings);
    find_blocks(lines, settings)
        .into_iter()
        .filter(|block| block.len() >= settings.min_rows)
        .map(|block| block_to_grid(block, settings))
        .filter(|grid| grid.len() >= settings.min_rows)
        .collect()
}
