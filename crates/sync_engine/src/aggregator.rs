//! Scene aggregator: bus poll and per-topic handlers.
//!
//! Handlers run in `Topic::ALL` order, so calibration is applied before any
//! projection in the same tick and radar leads are in place before the model
//! path is foreshortened against them.

use contracts::{
    Calibration, CameraExposure, ControlsState, DeviceState, GatewayType, GeometryConfig,
    GnssReport, GpsFix, HudEngineConfig, LateralControlState, LeadData, LightSource, LinkHealth,
    Message, ModelOutput, RadarState, Scene, SensorEvent, TelemetryBus, Topic, VehicleState,
    XyztLine,
};
use tracing::{debug, instrument, warn};

use crate::polyline::{build_ribbon, path_length_idx};
use crate::projection::ProjectionContext;

/// Polls the bus and folds updated topics into the scene
#[derive(Debug, Clone)]
pub struct SceneAggregator {
    projection: ProjectionContext,
    geometry: GeometryConfig,
    light_source: LightSource,
    link_timeout: u64,
    blinker_blink: u32,
    /// Latest controller state seen while started
    controls: ControlsState,
}

impl SceneAggregator {
    pub fn new(config: &HudEngineConfig) -> Self {
        Self {
            projection: ProjectionContext::new(config),
            geometry: config.geometry,
            light_source: config.light_source,
            link_timeout: config.periods.link_timeout,
            blinker_blink: config.periods.blinker_blink,
            controls: ControlsState::default(),
        }
    }

    pub fn projection(&self) -> &ProjectionContext {
        &self.projection
    }

    pub fn projection_mut(&mut self) -> &mut ProjectionContext {
        &mut self.projection
    }

    /// Controller state the status and alert logic evaluate
    pub fn controls(&self) -> &ControlsState {
        &self.controls
    }

    /// Poll once and apply every updated topic.
    ///
    /// Returns the number of updated topics; when zero the scene is untouched.
    #[instrument(level = "trace", name = "aggregator_update", skip_all)]
    pub fn update(&mut self, scene: &mut Scene, bus: &mut dyn TelemetryBus) -> usize {
        let updated = bus.poll();
        if updated == 0 {
            return 0;
        }

        for topic in Topic::ALL {
            if bus.updated(topic) {
                self.apply(scene, &*bus, topic);
            }
        }

        if !bus.updated(Topic::LinkHealth)
            && bus.frame().saturating_sub(bus.rcv_frame(Topic::LinkHealth)) > self.link_timeout
        {
            scene.device.gateway_type = GatewayType::Unknown;
        }

        scene.started = scene.device.started || scene.settings.driver_view;
        updated
    }

    fn apply(&mut self, scene: &mut Scene, bus: &dyn TelemetryBus, topic: Topic) {
        let Some(msg) = bus.get(topic) else {
            return;
        };
        if msg.topic() != topic {
            warn!(%topic, payload = %msg.topic(), "payload does not match topic, skipped");
            metrics::counter!("hud_payload_mismatch_total", "topic" => topic.as_str())
                .increment(1);
            return;
        }

        match msg {
            Message::Calibration(calib) => self.on_calibration(scene, calib),
            Message::RadarState(radar) => {
                let path = if bus.rcv_frame(Topic::Model) > 0 {
                    match bus.get(Topic::Model) {
                        Some(Message::Model(model)) => Some(&model.position),
                        _ => None,
                    }
                } else {
                    None
                };
                self.on_radar(scene, radar, path);
            }
            Message::Model(model) => self.on_model(scene, model),
            Message::ControlsState(controls) => {
                if scene.started {
                    self.on_controls(scene, controls);
                }
            }
            Message::VehicleState(vehicle) => self.on_vehicle(scene, vehicle),
            Message::LiveParameters(params) => scene.live_params = *params,
            Message::DeviceState(device) => on_device(scene, device),
            Message::LinkHealth(link) => on_link(scene, link),
            Message::GnssReport(report) => {
                let fix = match bus.get(Topic::GpsExternal) {
                    Some(Message::GpsExternal(fix)) => Some(fix),
                    _ => None,
                };
                on_gnss(scene, report, fix);
            }
            // read together with the raw positioning report
            Message::GpsExternal(_) => {}
            Message::Localization(loc) => scene.gnss.gps_ok = loc.gps_ok,
            Message::VehicleParams(params) => {
                scene.vehicle.longitudinal_control = params.longitudinal_control
            }
            Message::DriverState(state) => scene.driver_state = state.clone(),
            Message::DriverMonitoring(state) => scene.driver_monitoring = *state,
            Message::SensorEvents(events) => self.on_sensor_events(scene, events),
            Message::RoadCameraState(exposure) => {
                if self.light_source == LightSource::RoadCamera {
                    scene.device.light_sensor = light_from_exposure(exposure);
                }
            }
            Message::LanePlan(plan) => scene.lane_plan = *plan,
        }
    }

    fn on_calibration(&mut self, scene: &mut Scene, calib: &Calibration) {
        let [roll, pitch, yaw] = match calib.rpy_calib.as_slice() {
            [roll, pitch, yaw, ..] => [*roll, *pitch, *yaw],
            other => {
                warn!(len = other.len(), "calibration without roll/pitch/yaw, skipped");
                return;
            }
        };
        self.projection.set_calibration(roll, pitch, yaw);
        scene.view_from_calib = self.projection.view_from_calib_rows();
        scene.world_objects_visible = true;
    }

    fn on_radar(&mut self, scene: &mut Scene, radar: &RadarState, path: Option<&XyztLine>) {
        let leads = [radar.lead_one, radar.lead_two];
        for (i, lead) in leads.iter().enumerate() {
            if lead.status {
                let z = path
                    .and_then(|line| line.z.get(path_length_idx(line, lead.d_rel)))
                    .copied()
                    .unwrap_or(0.0);
                // radar reports lateral offset left-positive
                let (vertex, _) = self.projection.project(
                    lead.d_rel,
                    -lead.y_rel,
                    z + self.geometry.camera_height,
                );
                scene.lead_vertices[i] = vertex;
            }
            scene.lead_data[i] = *lead;
        }
    }

    fn on_model(&mut self, scene: &mut Scene, model: &ModelOutput) {
        let geometry = &self.geometry;
        let position = &model.position;
        let last_x = position.x.get(position.len().saturating_sub(1)).copied();
        let mut max_distance = last_x
            .unwrap_or(0.0)
            .max(geometry.min_draw_distance)
            .min(geometry.max_draw_distance);

        let max_idx = model
            .lane_lines
            .first()
            .map(|line| path_length_idx(line, max_distance))
            .unwrap_or(0);
        for (i, vertices) in scene.lane_line_vertices.iter_mut().enumerate() {
            let prob = model.lane_line_probs.get(i).copied().unwrap_or(0.0);
            scene.lane_line_probs[i] = prob;
            match model.lane_lines.get(i) {
                Some(line) => {
                    build_ribbon(
                        &self.projection,
                        line,
                        geometry.line_half_width_scale * prob,
                        0.0,
                        max_idx,
                        vertices,
                    );
                }
                None => vertices.clear(),
            }
        }

        for (i, vertices) in scene.road_edge_vertices.iter_mut().enumerate() {
            scene.road_edge_stds[i] = model.road_edge_stds.get(i).copied().unwrap_or(0.0);
            match model.road_edges.get(i) {
                Some(line) => {
                    build_ribbon(
                        &self.projection,
                        line,
                        geometry.road_edge_half_width,
                        0.0,
                        max_idx,
                        vertices,
                    );
                }
                None => vertices.clear(),
            }
        }

        let lead: &LeadData = &scene.lead_data[0];
        if lead.status {
            let lead_d = lead.d_rel * 2.0;
            max_distance = (lead_d - (lead_d * 0.35).min(10.0)).max(0.0).min(max_distance);
        }
        let path_idx = path_length_idx(position, max_distance);
        build_ribbon(
            &self.projection,
            position,
            geometry.path_half_width,
            geometry.camera_height,
            path_idx,
            &mut scene.track_vertices,
        );
    }

    fn on_controls(&mut self, scene: &mut Scene, controls: &ControlsState) {
        self.controls = controls.clone();

        let view = &mut scene.controls;
        view.enabled = controls.enabled;
        view.lateral_control_method = controls.lateral_control_state.method();
        match controls.lateral_control_state {
            LateralControlState::Pid { output }
            | LateralControlState::Indi { output }
            | LateralControlState::Lqr { output } => view.output_scale = output,
            // angle controller reports no normalized output
            LateralControlState::Angle { .. } => {}
        }
        view.angle_steers_des = controls.steering_angle_desired_deg;
        view.debug_text1.clone_from(&controls.debug_text1);
        view.debug_text2.clone_from(&controls.debug_text2);
        view.speed_camera_limit = controls.speed_camera_limit;
        view.speed_camera_distance = controls.speed_camera_distance;
        view.steer_ratio = controls.steer_ratio;
    }

    fn on_vehicle(&mut self, scene: &mut Scene, data: &VehicleState) {
        let vehicle = &mut scene.vehicle;
        if vehicle.left_blinker != data.left_blinker || vehicle.right_blinker != data.right_blinker
        {
            vehicle.blinker_blinking_rate = self.blinker_blink;
        }
        vehicle.v_ego = data.v_ego;
        vehicle.left_blinker = data.left_blinker;
        vehicle.right_blinker = data.right_blinker;
        vehicle.left_blindspot = data.left_blindspot;
        vehicle.right_blindspot = data.right_blindspot;
        vehicle.brake_pressed = data.brake_pressed;
        vehicle.brake_lights = data.brake_lights;
        vehicle.gear_shifter = data.gear_shifter;
        vehicle.tpms = data.tpms;
        vehicle.radar_distance = data.radar_distance;
        vehicle.stand_still = data.stand_still;
        vehicle.v_set_dis = data.v_set_dis;
        vehicle.cruise_acc_status = data.cruise_acc_status;
        vehicle.angle_steers = data.steering_angle_deg;
    }

    fn on_sensor_events(&mut self, scene: &mut Scene, events: &[SensorEvent]) {
        for event in events {
            match event {
                SensorEvent::Light(light) => {
                    if self.light_source == LightSource::SensorEvents {
                        scene.device.light_sensor = *light;
                    }
                }
                SensorEvent::Acceleration(v) if !scene.started => match v.get(2) {
                    Some(z) => scene.device.accel_sensor = *z,
                    None => warn!(len = v.len(), "short acceleration sample, skipped"),
                },
                SensorEvent::GyroUncalibrated(v) if !scene.started => match v.get(1) {
                    Some(y) => scene.device.gyro_sensor = *y,
                    None => warn!(len = v.len(), "short gyro sample, skipped"),
                },
                _ => {}
            }
        }
    }
}

fn on_device(scene: &mut Scene, data: &DeviceState) {
    let device = &mut scene.device;
    device.started = data.started;
    device.cpu_perc = data.cpu_usage_percent;
    if let Some(temp) = data.cpu_temp_c.first() {
        device.cpu_temp = *temp;
    }
    device.fan_speed = data.fan_speed_percent_desired;
    device.ip_addr.clone_from(&data.ip_addr);
}

fn on_link(scene: &mut Scene, link: &LinkHealth) {
    scene.device.gateway_type = link.gateway_type;
    scene.device.ignition = link.ignition_line || link.ignition_can;
}

fn on_gnss(scene: &mut Scene, report: &GnssReport, fix: Option<&GpsFix>) {
    if let GnssReport::MeasurementReport { num_meas } = report {
        scene.gnss.satellite_count = i32::try_from(*num_meas).unwrap_or(i32::MAX);
    }
    match fix {
        Some(fix) => {
            scene.gnss.accuracy = fix.accuracy;
            scene.gnss.altitude = fix.altitude;
            scene.gnss.bearing = fix.bearing_deg;
        }
        None => debug!("no external fix yet"),
    }
}

/// Ambient light (0..=1023) estimated from road camera exposure
pub fn light_from_exposure(exposure: &CameraExposure) -> f32 {
    let boost = if exposure.global_gain > 100 { 2.5 } else { 1.0 };
    let gain = f64::from(exposure.gain_frac) * boost / 10.0;
    let light = (1023.0 / 1757.0) * (1757.0 - f64::from(exposure.integ_lines)) * (1.0 - gain);
    light.clamp(0.0, 1023.0) as f32
}
