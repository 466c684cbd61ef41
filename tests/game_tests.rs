// tests/game_tests.rs
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use racetrack_core::{ClockState, GameState, ManualTime};
use racetrack_cv::{
    Centroid, ColorBand, ColorConversion, Contour, Game, GameConfig, HsvRange, ImageprocBackend,
    Result, VisionBackend, VisionError,
};
use std::cell::{Cell, RefCell};
use std::time::Duration;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const CENTER: (i32, i32) = (160, 120);

fn blank() -> RgbImage {
    RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([255, 255, 255]))
}

fn blob(color: [u8; 3], offset: (i32, i32)) -> RgbImage {
    let mut frame = blank();
    draw_filled_circle_mut(&mut frame, (CENTER.0 + offset.0, CENTER.1 + offset.1), 12, Rgb(color));
    frame
}

fn blue() -> RgbImage {
    blob([0, 0, 255], (0, 0))
}

fn red() -> RgbImage {
    blob([255, 0, 0], (0, 0))
}

fn square() -> RgbImage {
    let mut frame = blank();
    draw_filled_rect_mut(&mut frame, Rect::at(CENTER.0 - 12, CENTER.1 - 12).of_size(24, 24), Rgb([0, 0, 0]));
    frame
}

fn triangle() -> RgbImage {
    let mut frame = blank();
    let (cx, cy) = CENTER;
    let points = [Point::new(cx, cy - 16), Point::new(cx + 18, cy + 16), Point::new(cx - 18, cy + 16)];
    draw_polygon_mut(&mut frame, &points, Rgb([0, 0, 0]));
    frame
}

fn inverted_triangle(offset: (i32, i32), half: i32) -> RgbImage {
    let mut frame = blank();
    let (cx, cy) = (CENTER.0 + offset.0, CENTER.1 + offset.1);
    let points = [Point::new(cx, cy + half), Point::new(cx + half, cy - half), Point::new(cx - half, cy - half)];
    draw_polygon_mut(&mut frame, &points, Rgb([0, 0, 0]));
    frame
}

fn new_game() -> Result<(Game<ImageprocBackend, ManualTime>, ManualTime)> {
    let time = ManualTime::new();
    let game = Game::with_parts(GameConfig::default(), ImageprocBackend, time.clone())?;
    Ok((game, time))
}

fn tick_n<B: VisionBackend>(game: &mut Game<B, ManualTime>, frame: &RgbImage, n: usize) -> Result<()> {
    for _ in 0..n {
        game.tick(frame)?;
    }
    Ok(())
}

#[test]
fn test_eleven_blue_frames_start_the_race() -> Result<()> {
    let (mut game, _) = new_game()?;

    tick_n(&mut game, &blue(), 10)?;
    assert_eq!(game.current_state(), GameState::Ready);
    assert_eq!(game.machine().start_count(), 10);

    game.tick(&blue())?;
    assert_eq!(game.current_state(), GameState::Play);
    assert_eq!(game.machine().clock().state(), ClockState::Measuring);
    Ok(())
}

#[test]
fn test_red_frames_clear_the_race() -> Result<()> {
    let (mut game, time) = new_game()?;
    tick_n(&mut game, &blue(), 11)?;

    time.advance(Duration::from_millis(2500));
    tick_n(&mut game, &red(), 11)?;

    assert_eq!(game.current_state(), GameState::Clear);
    assert_eq!(game.machine().clock().state(), ClockState::Waiting);
    assert!(game.elapsed_time() > 0.0);

    let finished = game.elapsed_time();
    time.advance(Duration::from_secs(10));
    tick_n(&mut game, &red(), 3)?;
    assert_eq!(game.elapsed_time(), finished);
    Ok(())
}

#[test]
fn test_square_in_open_track_is_game_over() -> Result<()> {
    let (mut game, _) = new_game()?;
    tick_n(&mut game, &blue(), 11)?;

    game.tick(&square())?;
    assert_eq!(game.current_state(), GameState::GameOver);
    assert!(!game.machine().collision());
    Ok(())
}

#[test]
fn test_triangle_and_empty_track_are_safe() -> Result<()> {
    let (mut game, _) = new_game()?;
    tick_n(&mut game, &blue(), 11)?;

    tick_n(&mut game, &triangle(), 5)?;
    tick_n(&mut game, &blank(), 5)?;
    assert_eq!(game.current_state(), GameState::Play);
    assert!(!game.machine().collision());
    Ok(())
}

#[test]
fn test_inverted_triangles_keep_the_race_going() -> Result<()> {
    let (mut game, _) = new_game()?;
    tick_n(&mut game, &blue(), 11)?;

    for (offset, half) in [((0, 0), 16), ((-4, 2), 18), ((4, -3), 14), ((0, 0), 20)] {
        game.tick(&inverted_triangle(offset, half))?;
        assert_eq!(game.current_state(), GameState::Play, "half {half} at {offset:?}");
    }
    assert!(!game.machine().collision());
    Ok(())
}

#[test]
fn test_off_centre_blob_is_not_counted() -> Result<()> {
    let (mut game, _) = new_game()?;

    // only a corner of the blob reaches into the ROI, beyond the tolerance
    let frame = blob([0, 0, 255], (-35, -35));
    tick_n(&mut game, &frame, 20)?;
    assert_eq!(game.machine().start_count(), 0);
    assert_eq!(game.current_state(), GameState::Ready);

    tick_n(&mut game, &blob([0, 0, 255], (10, -10)), 3)?;
    assert_eq!(game.machine().start_count(), 3);
    Ok(())
}

#[test]
fn test_terminal_states_ignore_frames() -> Result<()> {
    let (mut game, _) = new_game()?;
    tick_n(&mut game, &blue(), 11)?;
    game.tick(&square())?;
    assert_eq!(game.current_state(), GameState::GameOver);

    tick_n(&mut game, &blue(), 20)?;
    tick_n(&mut game, &red(), 20)?;
    assert_eq!(game.current_state(), GameState::GameOver);

    // no detection runs, so undersized frames are not an error here
    game.tick(&RgbImage::new(8, 8))?;
    Ok(())
}

#[test]
fn test_small_frame_rejected_while_detecting() -> Result<()> {
    let (mut game, _) = new_game()?;
    let result = game.tick(&RgbImage::new(50, 50));
    assert!(matches!(
        result,
        Err(VisionError::InvalidFrameSize {
            width: 50,
            height: 50,
            required: 60
        })
    ));
    assert_eq!(game.current_state(), GameState::Ready);
    Ok(())
}

#[test]
fn test_reset_is_idempotent() -> Result<()> {
    let (mut game, time) = new_game()?;
    tick_n(&mut game, &blue(), 11)?;
    time.advance(Duration::from_secs(1));
    game.tick(&square())?;

    game.reset();
    let once = game.snapshot();
    game.reset();
    let twice = game.snapshot();

    assert_eq!(once, twice);
    assert_eq!(once.state, GameState::Ready);
    assert_eq!((once.start_count, once.goal_count), (0, 0));
    assert!(!once.collision);
    assert_eq!(once.elapsed_secs, 0.0);
    assert_eq!(game.last_transition(), None);
    Ok(())
}

/// Backend that reports a centred blob for one chosen colour range and a
/// fixed set of contours, without looking at pixels
#[derive(Default)]
struct ScriptedBackend {
    visible: RefCell<Option<HsvRange>>,
    contours: RefCell<Vec<Contour>>,
    perimeter_fails: Cell<bool>,
}

impl ScriptedBackend {
    fn show(&self, range: Option<HsvRange>) {
        *self.visible.borrow_mut() = range;
    }

    fn outline(&self, contours: Vec<Contour>) {
        *self.contours.borrow_mut() = contours;
    }
}

impl VisionBackend for ScriptedBackend {
    fn blur(&self, image: &RgbImage, _kernel_size: u32) -> Result<RgbImage> {
        Ok(image.clone())
    }

    fn equalize_local_contrast(&self, luma: &GrayImage, _clip: f64, _grid: u32) -> Result<GrayImage> {
        Ok(luma.clone())
    }

    fn convert_color(&self, image: &RgbImage, _conversion: ColorConversion) -> Result<RgbImage> {
        Ok(image.clone())
    }

    fn mask_in_range(&self, hsv: &RgbImage, range: &HsvRange) -> Result<GrayImage> {
        let value = if *self.visible.borrow() == Some(*range) { 255 } else { 0 };
        Ok(GrayImage::from_pixel(hsv.width(), hsv.height(), Luma([value])))
    }

    fn label_connected_components(&self, mask: &GrayImage) -> Result<Vec<Centroid>> {
        let area = mask.width() * mask.height();
        if mask.pixels().any(|p| p[0] > 0) {
            Ok(vec![Centroid::new(0.0, 0.0, 0), Centroid::new(30.0, 30.0, area)])
        } else {
            Ok(vec![Centroid::new(29.5, 29.5, area)])
        }
    }

    fn detect_edges(&self, image: &RgbImage, _low: f32, _high: f32) -> Result<GrayImage> {
        Ok(GrayImage::new(image.width(), image.height()))
    }

    fn morphological_close(&self, image: &GrayImage, _kernel_size: u32) -> Result<GrayImage> {
        Ok(image.clone())
    }

    fn find_external_contours(&self, _image: &GrayImage) -> Result<Vec<Contour>> {
        Ok(self.contours.borrow().clone())
    }

    fn approx_polygon(&self, contour: &Contour, _tolerance_ratio: f64) -> Result<Contour> {
        self.arc_length(contour)?;
        Ok(contour.clone())
    }

    fn arc_length(&self, contour: &Contour) -> Result<f64> {
        if self.perimeter_fails.get() {
            return Err(VisionError::DetectionFailure("perimeter unavailable".into()));
        }
        Ok(contour.len() as f64)
    }
}

fn polygon(points: &[(i32, i32)]) -> Contour {
    points.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

#[test]
fn test_collision_only_checked_off_zone() -> Result<()> {
    let time = ManualTime::new();
    let mut game = Game::with_parts(GameConfig::default(), ScriptedBackend::default(), time.clone())?;
    let frame = blank();
    let start = ColorBand::blue().primary;

    game.backend().show(Some(start));
    tick_n(&mut game, &frame, 11)?;
    assert_eq!(game.current_state(), GameState::Play);

    // a non-triangular outline while still on the start zone is ignored
    game.backend().outline(vec![polygon(&[(10, 10), (40, 10), (40, 40), (10, 40)])]);
    tick_n(&mut game, &frame, 5)?;
    assert_eq!(game.current_state(), GameState::Play);

    // a triangle anywhere in the ROI keeps the race safe
    game.backend().show(None);
    game.backend().outline(vec![
        polygon(&[(10, 10), (40, 10), (40, 40), (10, 40)]),
        polygon(&[(30, 5), (45, 30), (15, 30)]),
    ]);
    tick_n(&mut game, &frame, 5)?;
    assert_eq!(game.current_state(), GameState::Play);

    game.backend().outline(vec![polygon(&[(10, 10), (40, 10), (40, 40), (10, 40)])]);
    game.tick(&frame)?;
    assert_eq!(game.current_state(), GameState::GameOver);
    Ok(())
}

#[test]
fn test_goal_band_union_and_debounce_override() -> Result<()> {
    let config = GameConfig::default().with_debounce_threshold(2);
    let mut game = Game::with_parts(config, ScriptedBackend::default(), ManualTime::new())?;
    let frame = blank();
    assert_eq!(game.machine().debounce_threshold(), 2);

    game.backend().show(Some(ColorBand::blue().primary));
    tick_n(&mut game, &frame, 3)?;
    assert_eq!(game.current_state(), GameState::Play);

    // the upper half of the red hue range alone is enough
    let wrap = ColorBand::red().secondary.ok_or(VisionError::InvalidConfig("red has two ranges".into()))?;
    game.backend().show(Some(wrap));
    tick_n(&mut game, &frame, 2)?;
    assert_eq!(game.current_state(), GameState::Play);
    game.tick(&frame)?;
    assert_eq!(game.current_state(), GameState::Clear);
    Ok(())
}

#[test]
fn test_perimeter_failure_aborts_the_tick() -> Result<()> {
    let mut game = Game::with_parts(GameConfig::default(), ScriptedBackend::default(), ManualTime::new())?;
    let frame = blank();

    game.backend().show(Some(ColorBand::blue().primary));
    tick_n(&mut game, &frame, 11)?;
    assert_eq!(game.current_state(), GameState::Play);

    game.backend().show(None);
    game.backend().outline(vec![polygon(&[(10, 10), (40, 10), (40, 40), (10, 40)])]);
    game.backend().perimeter_fails.set(true);
    let before = game.snapshot();
    assert!(matches!(game.tick(&frame), Err(VisionError::DetectionFailure(_))));
    assert_eq!(game.snapshot(), before);

    game.backend().perimeter_fails.set(false);
    game.tick(&frame)?;
    assert_eq!(game.current_state(), GameState::GameOver);
    Ok(())
}
