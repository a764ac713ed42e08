/// First-order-differential peak detection over a 1-D count series.
///
/// A peak is a position where the repaired first-order difference changes
/// sign from positive to negative and the count clears the relative
/// threshold. `thres` is relative to the series range; `min_dist` prunes
/// nearby peaks greedily from the tallest down and is inert when <= 1.
/// Returned indices are 0-based and ascending.
pub fn find_peaks(y: &[u32], thres: f64, min_dist: isize) -> Vec<usize> {
    let n = y.len();
    if n < 2 {
        return Vec::new();
    }

    let min = *y.iter().min().expect("non-empty series") as f64;
    let max = *y.iter().max().expect("non-empty series") as f64;
    let thres_abs = thres * (max - min) + min;

    let mut dy: Vec<f64> = y.windows(2).map(|w| w[1] as f64 - w[0] as f64).collect();
    let zeros: Vec<usize> = (0..dy.len()).filter(|&i| dy[i] == 0.0).collect();

    // Totally flat signal
    if zeros.len() == dy.len() {
        return Vec::new();
    }

    repair_plateaus(&mut dy, &zeros);

    let mut peaks: Vec<usize> = (0..n)
        .filter(|&i| {
            let left = if i == 0 { 0.0 } else { dy[i - 1] };
            let right = if i == n - 1 { 0.0 } else { dy[i] };
            left > 0.0 && right < 0.0 && (y[i] as f64) > thres_abs
        })
        .collect();

    if peaks.len() > 1 && min_dist > 1 {
        let min_dist = min_dist as usize;
        // Descending height; equal heights visited highest-index-first, the
        // order a reversed stable argsort produces
        let mut by_height = peaks.clone();
        by_height.sort_by(|&a, &b| y[b].cmp(&y[a]).then(b.cmp(&a)));

        let mut removed = vec![true; n];
        for &peak in &peaks {
            removed[peak] = false;
        }
        for &peak in &by_height {
            if !removed[peak] {
                let lo = peak.saturating_sub(min_dist);
                let hi = (peak + min_dist + 1).min(n);
                for slot in &mut removed[lo..hi] {
                    *slot = true;
                }
                removed[peak] = false;
            }
        }
        peaks = (0..n).filter(|&i| !removed[i]).collect();
    }

    peaks
}

/// Zero runs in the difference series hide peaks on plateaus. Fill each run
/// by propagating the neighboring non-zero differences inward: the left half
/// (median split) takes the value left of the run, the rest the value right
/// of it. Runs touching either end copy the single adjacent value.
fn repair_plateaus(dy: &mut [f64], zeros: &[usize]) {
    if zeros.is_empty() {
        return;
    }

    let mut plateaus: Vec<&[usize]> = Vec::new();
    let mut run_start = 0;
    for i in 1..zeros.len() {
        if zeros[i] != zeros[i - 1] + 1 {
            plateaus.push(&zeros[run_start..i]);
            run_start = i;
        }
    }
    plateaus.push(&zeros[run_start..]);

    let mut first = 0;
    let mut last = plateaus.len();
    if plateaus[0][0] == 0 {
        let fill = dy[*plateaus[0].last().expect("non-empty plateau") + 1];
        for &i in plateaus[0] {
            dy[i] = fill;
        }
        first = 1;
    }
    if last > first && plateaus[last - 1].last() == Some(&(dy.len() - 1)) {
        let plateau = plateaus[last - 1];
        let fill = dy[plateau[0] - 1];
        for &i in plateau {
            dy[i] = fill;
        }
        last -= 1;
    }

    for plateau in &plateaus[first..last] {
        let median = median_index(plateau);
        let left_fill = dy[plateau[0] - 1];
        let right_fill = dy[plateau.last().expect("non-empty plateau") + 1];
        for &i in *plateau {
            dy[i] = if (i as f64) < median {
                left_fill
            } else {
                right_fill
            };
        }
    }
}

fn median_index(indices: &[usize]) -> f64 {
    let len = indices.len();
    if len % 2 == 1 {
        indices[len / 2] as f64
    } else {
        (indices[len / 2 - 1] + indices[len / 2]) as f64 / 2.0
    }
}
