//! Static sensor catalog.
//!
//! Each row names where a value lives in the controller payload, the metric
//! slug it is published under, and its Home-Assistant presentation. Metric
//! slugs are explicit rather than derived from the friendly name so that two
//! rows sharing a name (the live and the information-panel compressor
//! frequency, for instance) still get distinct ids.

use e24_protocol::SensorKind;

/// Where a catalog value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// `params.curr.<key>`
    Current(&'static str),
    /// `params.<key>`
    Root(&'static str),
    /// Editable parameter whose `name` attribute is `<key>`.
    Editable(&'static str),
    /// `informationParams.<key>`
    Information(&'static str),
    /// Computed from other fields.
    Derived(Derivation),
}

/// Values the bridge computes rather than reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Flow minus return temperature.
    DeltaT,
    /// Compressor frequency above zero, or an active work state.
    CompressorRunning,
    /// Any non-zero work state.
    HeatPumpRunning,
}

/// How a raw value becomes a [`SensorValue`](e24_protocol::SensorValue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Plain measurement.
    Number,
    /// Enumerated controller code, published as-is.
    Code,
    /// Heat-pump work-state code, published as its label.
    WorkState,
}

/// One catalog row.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub source: Source,
    /// Metric slug, the per-device part of the sensor id.
    pub metric: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<&'static str>,
    pub icon: Option<&'static str>,
    pub kind: SensorKind,
    pub transform: Transform,
}

impl FieldDef {
    /// `state_class` announced in discovery.
    pub fn state_class(&self) -> Option<&'static str> {
        match (self.kind, self.transform, self.device_class) {
            (SensorKind::BinarySensor, _, _) => None,
            (_, Transform::Code | Transform::WorkState, _) => None,
            (_, _, Some("energy")) => Some("total_increasing"),
            _ => Some("measurement"),
        }
    }

    const fn icon(self, icon: &'static str) -> Self {
        Self {
            icon: Some(icon),
            ..self
        }
    }
}

// ----------------------------------------------------------------------------
// Row builders
// ----------------------------------------------------------------------------

const fn temperature(source: Source, metric: &'static str, name: &'static str) -> FieldDef {
    FieldDef {
        source,
        metric,
        name,
        unit: Some("°C"),
        device_class: Some("temperature"),
        icon: Some("mdi:thermometer"),
        kind: SensorKind::Sensor,
        transform: Transform::Number,
    }
}

const fn measurement(
    source: Source,
    metric: &'static str,
    name: &'static str,
    unit: Option<&'static str>,
    device_class: Option<&'static str>,
) -> FieldDef {
    FieldDef {
        source,
        metric,
        name,
        unit,
        device_class,
        icon: None,
        kind: SensorKind::Sensor,
        transform: Transform::Number,
    }
}

const fn code(source: Source, metric: &'static str, name: &'static str) -> FieldDef {
    FieldDef {
        source,
        metric,
        name,
        unit: None,
        device_class: None,
        icon: None,
        kind: SensorKind::Sensor,
        transform: Transform::Code,
    }
}

const fn running(derivation: Derivation, metric: &'static str, name: &'static str) -> FieldDef {
    FieldDef {
        source: Source::Derived(derivation),
        metric,
        name,
        unit: None,
        device_class: Some("running"),
        icon: None,
        kind: SensorKind::BinarySensor,
        transform: Transform::Number,
    }
}

use Source::{Current, Editable, Information, Root};

/// Heat-pump flow (outgoing) temperature.
pub const FLOW_TEMPERATURE: Source = Current("GrantOutgoingTemp");
/// Heat-pump return temperature.
pub const RETURN_TEMPERATURE: Source = Current("GrantReturnTemp");
/// Live compressor frequency.
pub const COMPRESSOR_FREQUENCY: Source = Current("GrantCompressorFreq");
/// Heat-pump work-state code.
pub const WORK_STATE: Source = Current("GrantWorkState");

// ----------------------------------------------------------------------------
// Catalog
// ----------------------------------------------------------------------------

/// Every sensor the bridge can publish, in publication order.
pub static FIELDS: &[FieldDef] = &[
    // ===== Heat pump =====
    temperature(FLOW_TEMPERATURE, "heat_pump_flow_temperature", "Heat Pump Flow Temperature"),
    temperature(RETURN_TEMPERATURE, "heat_pump_return_temperature", "Heat Pump Return Temperature"),
    temperature(Current("GrantOutdoorTemp"), "heat_pump_outdoor_temperature", "Heat Pump Outdoor Temperature"),
    measurement(COMPRESSOR_FREQUENCY, "compressor_frequency", "Compressor Frequency", Some("Hz"), Some("frequency"))
        .icon("mdi:sine-wave"),
    measurement(Current("GrantPumpSpeed"), "pump_speed", "Pump Speed", Some("RPM"), None).icon("mdi:pump"),
    FieldDef {
        transform: Transform::WorkState,
        ..code(WORK_STATE, "heat_pump_work_state", "Heat Pump Work State").icon("mdi:heat-pump")
    },
    code(WORK_STATE, "heat_pump_work_state_code", "Heat Pump Work State Code").icon("mdi:heat-pump"),
    measurement(Current("GrantFlow"), "heat_pump_flow_rate", "Heat Pump Flow Rate", Some("L/min"), None)
        .icon("mdi:water-pump"),
    measurement(Current("GrantPower"), "heat_pump_power", "Heat Pump Power", Some("W"), Some("power")).icon("mdi:flash"),
    measurement(Current("GrantCOP"), "coefficient_of_performance", "Coefficient of Performance", None, None)
        .icon("mdi:chart-line"),
    // ===== Derived =====
    FieldDef {
        source: Source::Derived(Derivation::DeltaT),
        ..temperature(FLOW_TEMPERATURE, "heat_pump_delta_t", "Heat Pump Delta T")
    }
    .icon("mdi:thermometer-lines"),
    running(Derivation::CompressorRunning, "compressor_running", "Compressor Running").icon("mdi:sine-wave"),
    running(Derivation::HeatPumpRunning, "heat_pump_running", "Heat Pump Running").icon("mdi:heat-pump"),
    // ===== Temperatures =====
    temperature(Current("TempWthr"), "weather_temperature", "Weather Temperature").icon("mdi:weather-partly-cloudy"),
    temperature(Current("TempCWU"), "hot_water_temperature", "Hot Water Temperature").icon("mdi:water-boiler"),
    temperature(Current("TempBuforUp"), "buffer_tank_top_temperature", "Buffer Tank Top Temperature")
        .icon("mdi:storage-tank"),
    temperature(Current("TempBuforDown"), "buffer_tank_bottom_temperature", "Buffer Tank Bottom Temperature")
        .icon("mdi:storage-tank"),
    temperature(Current("TempClutch"), "clutch_temperature", "Clutch Temperature"),
    temperature(Current("TempCircuit1"), "circuit_1_temperature", "Circuit 1 Temperature"),
    temperature(Current("TempCircuit2"), "circuit_2_temperature", "Circuit 2 Temperature"),
    temperature(Current("TempCircuit3"), "circuit_3_temperature", "Circuit 3 Temperature"),
    // ===== Calculated setpoints =====
    temperature(Current("HeatSourceCalcPresetTemp"), "calculated_heating_setpoint", "Calculated Heating Setpoint")
        .icon("mdi:thermometer-auto"),
    temperature(Current("Circuit1SetTemp"), "circuit_1_setpoint", "Circuit 1 Setpoint").icon("mdi:thermometer-check"),
    temperature(Current("Circuit2SetTemp"), "circuit_2_setpoint", "Circuit 2 Setpoint").icon("mdi:thermometer-check"),
    temperature(Current("C1CalcTemp"), "circuit_1_calculated_setpoint", "Circuit 1 Calculated Setpoint")
        .icon("mdi:thermometer-auto"),
    temperature(Current("C2CalcTemp"), "circuit_2_calculated_setpoint", "Circuit 2 Calculated Setpoint")
        .icon("mdi:thermometer-auto"),
    // ===== Thermostats =====
    temperature(Current("Circuit1thermostat"), "circuit_1_thermostat", "Circuit 1 Thermostat").icon("mdi:thermostat"),
    temperature(Current("Circuit2thermostatTemp"), "circuit_2_thermostat", "Circuit 2 Thermostat").icon("mdi:thermostat"),
    temperature(Current("Circuit3thermostatTemp"), "circuit_3_thermostat", "Circuit 3 Thermostat").icon("mdi:thermostat"),
    // ===== Editable setpoints =====
    temperature(Editable("HDWTSetPoint"), "hot_water_setpoint", "Hot Water Setpoint").icon("mdi:thermometer-check"),
    temperature(Editable("BuforsetPoint"), "buffer_setpoint", "Buffer Setpoint").icon("mdi:thermometer-check"),
    temperature(Editable("Circuit1ComfortTemp"), "circuit_1_comfort_temperature", "Circuit 1 Comfort Temperature")
        .icon("mdi:thermometer-check"),
    temperature(Editable("Circuit1EcoTemp"), "circuit_1_eco_temperature", "Circuit 1 Eco Temperature")
        .icon("mdi:thermometer-check"),
    temperature(Editable("Circuit1BaseTemp"), "circuit_1_base_temperature", "Circuit 1 Base Temperature")
        .icon("mdi:thermometer-check"),
    temperature(Editable("Circuit2ComfortTemp"), "circuit_2_comfort_temperature", "Circuit 2 Comfort Temperature")
        .icon("mdi:thermometer-check"),
    temperature(Editable("Circuit2EcoTemp"), "circuit_2_eco_temperature", "Circuit 2 Eco Temperature")
        .icon("mdi:thermometer-check"),
    temperature(Editable("Circuit2BaseTemp"), "circuit_2_base_temperature", "Circuit 2 Base Temperature")
        .icon("mdi:thermometer-check"),
    temperature(Editable("Circuit3ComfortTemp"), "circuit_3_comfort_temperature", "Circuit 3 Comfort Temperature")
        .icon("mdi:thermometer-check"),
    temperature(Editable("Circuit3EcoTemp"), "circuit_3_eco_temperature", "Circuit 3 Eco Temperature")
        .icon("mdi:thermometer-check"),
    temperature(Editable("Circuit3BaseTemp"), "circuit_3_base_temperature", "Circuit 3 Base Temperature")
        .icon("mdi:thermometer-check"),
    code(Editable("Circuit1WorkState"), "circuit_1_work_state", "Circuit 1 Work State").icon("mdi:radiator"),
    code(Editable("Circuit2WorkState"), "circuit_2_work_state", "Circuit 2 Work State").icon("mdi:radiator"),
    code(Editable("Circuit3WorkState"), "circuit_3_work_state", "Circuit 3 Work State").icon("mdi:radiator"),
    code(Editable("Circuit1CurveRadiator"), "circuit_1_heating_curve", "Circuit 1 Heating Curve")
        .icon("mdi:chart-line"),
    code(Editable("Circuit2CurveFloor"), "circuit_2_heating_curve", "Circuit 2 Heating Curve")
        .icon("mdi:chart-line"),
    code(Editable("HeatingCooling"), "heating_cooling_mode", "Heating/Cooling Mode").icon("mdi:hvac"),
    temperature(Editable("SummerOn"), "summer_mode_on_temperature", "Summer Mode On Temperature")
        .icon("mdi:weather-sunny"),
    temperature(Editable("SummerOff"), "summer_mode_off_temperature", "Summer Mode Off Temperature")
        .icon("mdi:weather-sunny"),
    // ===== Information panel =====
    measurement(Information("21"), "info_compressor_frequency", "Compressor Frequency (Info)", Some("Hz"), Some("frequency"))
        .icon("mdi:sine-wave"),
    measurement(Information("22"), "fan_speed", "Fan Speed", Some("RPM"), None).icon("mdi:fan"),
    measurement(Information("231"), "current_flow_rate", "Current Flow Rate", Some("L/min"), None)
        .icon("mdi:water-pump"),
    measurement(Information("211"), "electrical_power", "Electrical Power", Some("kW"), Some("power"))
        .icon("mdi:flash"),
    measurement(Information("26"), "circulation_pump_speed", "Circulation Pump Speed", Some("RPM"), None)
        .icon("mdi:pump"),
    measurement(Information("203"), "heat_energy", "Heat Energy", Some("Wh"), Some("energy"))
        .icon("mdi:lightning-bolt"),
    temperature(Information("24"), "heat_pump_target_temperature", "Heat Pump Target Temperature")
        .icon("mdi:thermometer-check"),
    temperature(Information("25"), "info_return_temperature", "Heat Pump Return Temperature (Info)"),
    measurement(Information("212"), "current_cop", "Current COP", None, None).icon("mdi:chart-line"),
    // ===== Connectivity =====
    measurement(Root("wifiQuality"), "wifi_quality", "WiFi Quality", Some("%"), None).icon("mdi:wifi"),
    measurement(Root("wifiStrength"), "wifi_signal_strength", "WiFi Signal Strength", Some("dBm"), Some("signal_strength"))
        .icon("mdi:wifi"),
];

/// Look up a catalog row by metric slug.
pub fn find(metric: &str) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|f| f.metric == metric)
}
