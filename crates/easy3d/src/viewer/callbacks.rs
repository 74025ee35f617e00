//! Mouse and keyboard bindings of the viewer.

use easy3d_core::{with_settings, Box3, Quat, Vec2, Vec3};
use easy3d_render::{Drawable, DrawableKind, Frame, ScreenAxis};

use super::input::{Event, Key, Modifiers, MouseButton};
use super::Viewer;

/// Angle of one Left/Right key turn.
const TURN_ANGLE: f32 = std::f32::consts::PI / 180.0;
/// Fraction of the scene radius moved by one arrow key press.
const MOVE_STEP: f32 = 0.05;
/// Smallest drag, in pixels, that zooms on a region.
const MIN_REGION: f32 = 3.0;

impl Viewer {
    /// Dispatches one input event. Returns whether the view changed.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match *event {
            Event::MousePress {
                x,
                y,
                button,
                modifiers,
            } => self.mouse_press_event(x, y, button, modifiers),
            Event::MouseRelease {
                x,
                y,
                button,
                modifiers,
            } => self.mouse_release_event(x, y, button, modifiers),
            Event::MouseMove {
                x,
                y,
                left,
                right,
                middle,
                modifiers,
            } => {
                let button = if left {
                    Some(MouseButton::Left)
                } else if right {
                    Some(MouseButton::Right)
                } else if middle {
                    Some(MouseButton::Middle)
                } else {
                    None
                };
                self.mouse_move_event(x, y, button, modifiers)
            }
            Event::Scroll { delta, .. } => self.mouse_scroll_event(delta),
            Event::KeyPress { key, modifiers } => self.key_press_event(key, modifiers),
            Event::Resize { width, height } => {
                self.resize(width, height);
                true
            }
            Event::Redraw { dt } => self.update(dt),
            Event::Close => {
                self.exit.request_exit();
                false
            }
        }
    }

    fn mouse_press_event(
        &mut self,
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    ) -> bool {
        let pos = Vec2::new(x, y);
        self.mouse.pressed = Some((button, modifiers, pos));
        self.mouse.last = pos;
        self.camera.frame_mut().action_start();

        if modifiers == Modifiers::SHIFT {
            match button {
                MouseButton::Left => {
                    self.pick_pivot(x, y);
                    return true;
                }
                MouseButton::Right => {
                    self.camera.interpolate_to_fit_scene();
                    let center = self.camera.scene_center();
                    self.camera.set_pivot_point(center);
                    self.pivot_hint = 0.0;
                    return true;
                }
                MouseButton::Middle => {}
            }
        }
        false
    }

    /// Makes the point under the cursor the pivot, or resets the pivot to the
    /// scene center when nothing is there.
    fn pick_pivot(&mut self, x: f32, y: f32) {
        if let Some(p) = self.point_under_pixel(x, y) {
            self.camera.interpolate_to_look_at(p);
            self.camera.set_pivot_point(p);
            self.pivot_hint = with_settings(|s| s.pivot_hint_duration);
            log::debug!("pivot point: {p}");
        } else {
            let center = self.camera.scene_center();
            self.camera.set_pivot_point(center);
            self.pivot_hint = 0.0;
        }
    }

    fn mouse_release_event(
        &mut self,
        x: f32,
        y: f32,
        button: MouseButton,
        _modifiers: Modifiers,
    ) -> bool {
        let mut changed = false;
        if let Some((MouseButton::Left, pressed_modifiers, start)) = self.mouse.pressed {
            if button == MouseButton::Left
                && pressed_modifiers == Modifiers::CTRL
                && (Vec2::new(x, y) - start).abs().min_element() >= MIN_REGION
            {
                self.camera.fit_screen_region(start.x, start.y, x, y);
                changed = true;
            }
        }
        self.camera.frame_mut().action_end();
        self.mouse.pressed = None;
        self.mouse.last = Vec2::new(x, y);
        changed
    }

    fn mouse_move_event(
        &mut self,
        x: f32,
        y: f32,
        button: Option<MouseButton>,
        modifiers: Modifiers,
    ) -> bool {
        let pos = Vec2::new(x, y);
        let delta = pos - self.mouse.last;
        self.mouse.last = pos;

        let Some(button) = button else {
            return false;
        };
        // Shift clicks pick, Ctrl+Left drags select a region.
        if modifiers.shift || modifiers.ctrl || delta == Vec2::ZERO {
            return false;
        }
        match button {
            MouseButton::Left => {
                let axis = if modifiers.alt {
                    ScreenAxis::Orthogonal
                } else {
                    ScreenAxis::None
                };
                self.camera.action_rotate(x, y, delta.x, delta.y, axis);
            }
            MouseButton::Right => {
                let axis = if !modifiers.alt {
                    ScreenAxis::None
                } else if delta.x.abs() > delta.y.abs() {
                    ScreenAxis::Horizontal
                } else {
                    ScreenAxis::Vertical
                };
                self.camera.action_translate(delta.x, delta.y, axis);
            }
            MouseButton::Middle => {
                if delta.y.abs() > 0.0 {
                    self.camera.action_zoom(-delta.y.signum());
                }
            }
        }
        true
    }

    fn mouse_scroll_event(&mut self, delta: f32) -> bool {
        if delta == 0.0 {
            return false;
        }
        // One step per wheel event, however many notches it carries.
        self.camera.action_zoom(delta.signum());
        true
    }

    /// Moves the camera by `local` (camera coordinates, scaled by the scene radius).
    fn move_camera(&mut self, local: Vec3) {
        let step = MOVE_STEP * self.camera.scene_radius();
        let world = self
            .camera
            .frame()
            .frame()
            .inverse_transform_of(local * step);
        self.camera.frame_mut().frame_mut().translate(world);
    }

    fn key_press_event(&mut self, key: Key, modifiers: Modifiers) -> bool {
        let none = modifiers.is_none();
        let ctrl = modifiers == Modifiers::CTRL;
        let alt = modifiers == Modifiers::ALT;

        match key {
            Key::F1 if none => {
                log::info!("\n{}", Self::usage());
                false
            }
            Key::Left if none => {
                self.camera.frame_mut().action_turn(TURN_ANGLE);
                true
            }
            Key::Right if none => {
                self.camera.frame_mut().action_turn(-TURN_ANGLE);
                true
            }
            Key::Up if none => {
                self.move_camera(Vec3::NEG_Z);
                true
            }
            Key::Down if none => {
                self.move_camera(Vec3::Z);
                true
            }
            Key::Left if ctrl => {
                self.move_camera(Vec3::NEG_X);
                true
            }
            Key::Right if ctrl => {
                self.move_camera(Vec3::X);
                true
            }
            Key::Up if ctrl => {
                self.move_camera(Vec3::Y);
                true
            }
            Key::Down if ctrl => {
                self.move_camera(Vec3::NEG_Y);
                true
            }
            Key::Space if none => {
                let pivot = Frame::new(self.camera.pivot_point(), Quat::IDENTITY);
                self.camera
                    .frame_mut()
                    .frame_mut()
                    .align_with_frame(Some(&pivot), true, 0.0);
                true
            }
            Key::Delete if none => {
                if let Some(i) = self.current {
                    self.delete_model(i);
                }
                true
            }
            Key::Char(c) if none => self.char_key(c),
            Key::Char(c) if ctrl => self.ctrl_char_key(c),
            Key::Char('k') if alt => {
                self.add_key_frame();
                false
            }
            _ => false,
        }
    }

    fn char_key(&mut self, c: char) -> bool {
        match c {
            'a' => self.show_axes = !self.show_axes,
            'c' => self.fit_screen(self.current),
            'f' => self.fit_screen(None),
            'p' => self.camera.toggle_projection_mode(),
            '[' => self.adjust_all_drawables(|d| {
                if d.kind() == DrawableKind::Lines {
                    d.set_line_width(d.line_width() - 1.0);
                }
            }),
            ']' => self.adjust_all_drawables(|d| {
                if d.kind() == DrawableKind::Lines {
                    d.set_line_width(d.line_width() + 1.0);
                }
            }),
            '-' => self.adjust_all_drawables(|d| {
                if d.kind() == DrawableKind::Points {
                    d.set_point_size(d.point_size() - 1.0);
                }
            }),
            '=' => self.adjust_all_drawables(|d| {
                if d.kind() == DrawableKind::Points {
                    d.set_point_size(d.point_size() + 1.0);
                }
            }),
            ',' | '.' => {
                let n = self.models.len();
                if n == 0 {
                    return false;
                }
                let current = self.current.unwrap_or(0);
                let next = if c == ',' { (current + n - 1) % n } else { (current + 1) % n };
                self.current = Some(next);
                log::info!("current model: {next}, {}", self.models[next].model.name());
            }
            'e' => return self.toggle_current_drawable("edges"),
            'v' => return self.toggle_current_drawable("vertices"),
            'b' => return self.toggle_current_drawable("borders"),
            'l' => return self.toggle_current_drawable("locks"),
            'm' => {
                let Some(renderer) = self.current.and_then(|i| self.renderer_mut(i)) else {
                    return false;
                };
                if let Some(faces) = renderer.get_triangles_drawable_mut("faces") {
                    faces.set_smooth_shading(!faces.smooth_shading());
                }
            }
            'd' => {
                self.print_current_model_info();
                return false;
            }
            _ => return false,
        }
        true
    }

    fn ctrl_char_key(&mut self, c: char) -> bool {
        match c {
            '-' => self.camera.action_zoom(-1.0),
            '=' => self.camera.action_zoom(1.0),
            'd' => self.delete_camera_path(),
            'k' => self.toggle_camera_path(),
            _ => return false,
        }
        true
    }

    /// Applies `f` to the drawables of every model.
    fn adjust_all_drawables(&mut self, f: impl Fn(&mut Drawable)) {
        for entry in &mut self.models {
            entry.renderer.drawables_mut().for_each(&f);
        }
    }

    /// Shows or hides a drawable of the current model. Returns `false` when
    /// the model has no such drawable.
    fn toggle_current_drawable(&mut self, name: &str) -> bool {
        let Some(renderer) = self.current.and_then(|i| self.renderer_mut(i)) else {
            return false;
        };
        match renderer.drawables_mut().find(|d| d.name() == name) {
            Some(d) => {
                d.set_visible(!d.is_visible());
                true
            }
            None => {
                log::debug!("current model has no '{name}' drawable");
                false
            }
        }
    }

    fn print_current_model_info(&self) {
        let Some(model) = self.current_model() else {
            log::info!("no model");
            return;
        };
        let mut info = format!(
            "{} '{}': {} vertices",
            model.type_name(),
            model.name(),
            model.n_vertices()
        );
        for line in model.property_stats() {
            info.push_str("\n    ");
            info.push_str(&line);
        }
        log::info!("{info}");
    }

    /// Adds the current camera frame to the camera path and grows the scene
    /// radius so that the whole path stays visible.
    fn add_key_frame(&mut self) {
        let frame = *self.camera.frame().frame();
        let interpolator = self.camera.keyframe_interpolator_mut();
        interpolator.add_keyframe(frame);
        let n = interpolator.number_of_keyframes();

        let center = self.camera.scene_center();
        let radius = self
            .camera
            .keyframe_interpolator()
            .keyframes()
            .iter()
            .map(|k| k.frame.position().distance(center))
            .fold(self.camera.scene_radius(), f32::max);
        self.camera.set_scene_radius(radius);
        log::info!("key frame {n} added to the camera path");
    }

    fn delete_camera_path(&mut self) {
        let interpolator = self.camera.keyframe_interpolator_mut();
        interpolator.stop_interpolation();
        interpolator.delete_path();

        // The scene radius may have grown with the path.
        let mut bbox = Box3::new();
        for entry in &self.models {
            bbox.grow_box(&entry.model.bounding_box());
        }
        if bbox.is_valid() {
            self.camera
                .set_scene_bounding_box(bbox.min_point(), bbox.max_point());
        }
        log::info!("camera path deleted");
    }

    fn toggle_camera_path(&mut self) {
        let interpolator = self.camera.keyframe_interpolator_mut();
        if interpolator.is_interpolation_started() {
            interpolator.stop_interpolation();
            log::info!("camera path stopped");
        } else if interpolator.number_of_keyframes() == 0 {
            log::warn!("the camera path is empty; add key frames with Alt+K");
        } else {
            interpolator.start_interpolation();
            log::info!("playing the camera path");
        }
    }
}
