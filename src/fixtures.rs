#[cfg(test)]
pub mod test {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    use crate::{MemorySize, Period};

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SampleEnum {
        #[serde(rename = "ELEMENT")]
        Element,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct SimpleObj {
        pub string: String,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct BasicTypes {
        pub char: char,
        pub string: String,
        pub bool: bool,
        pub byte: i8,
        pub int: i32,
        pub long: i64,
        pub short: i16,
        pub float: f32,
        pub double: f64,
        #[serde(rename = "enum")]
        pub kind: SampleEnum,
    }

    pub fn basic_types() -> BasicTypes {
        BasicTypes {
            char: 'a',
            string: "abc".into(),
            bool: true,
            byte: 1,
            int: i32::MAX,
            long: i64::MAX,
            short: i16::MAX,
            float: f32::MAX,
            double: f64::MAX,
            kind: SampleEnum::Element,
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Inner {
        pub obj: SimpleObj,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Outer {
        pub inner: Inner,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct BasicTypeLists {
        pub char: Vec<char>,
        pub string: Vec<String>,
        pub bool: Vec<bool>,
        pub byte: Vec<i8>,
        pub int: Vec<i32>,
        pub long: Vec<i64>,
        pub short: Vec<i16>,
        pub float: Vec<f32>,
        pub double: Vec<f64>,
        #[serde(rename = "enum")]
        pub kind: Vec<SampleEnum>,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct ObjectList {
        pub objects: Vec<SimpleObj>,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct NestedList {
        pub ints: Vec<Vec<i32>>,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct ObjectListMap {
        pub map: BTreeMap<String, ObjectList>,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Periods {
        pub period1: Period,
        pub period2: Period,
        pub period3: Period,
        pub period4: Period,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Durations {
        #[serde(with = "crate::duration")]
        pub duration1: Duration,
        #[serde(with = "crate::duration")]
        pub duration2: Duration,
        #[serde(with = "crate::duration")]
        pub duration3: Duration,
        #[serde(with = "crate::duration")]
        pub duration4: Duration,
        #[serde(with = "crate::duration")]
        pub duration5: Duration,
        #[serde(with = "crate::duration")]
        pub duration6: Duration,
        #[serde(with = "crate::duration")]
        pub duration7: Duration,
    }

    pub fn durations() -> Durations {
        Durations {
            duration1: Duration::from_nanos(1),
            duration2: Duration::from_nanos(1_000),
            duration3: Duration::from_millis(1),
            duration4: Duration::from_secs(1),
            duration5: Duration::from_secs(60),
            duration6: Duration::from_secs(3_600),
            duration7: Duration::from_secs(86_400),
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct MemSizes {
        pub mem1: MemorySize,
        pub mem2: MemorySize,
        pub mem3: MemorySize,
        pub mem4: MemorySize,
        pub mem5: MemorySize,
        pub mem6: MemorySize,
        pub mem7: MemorySize,
    }

    pub fn mem_sizes() -> MemSizes {
        let pow = |n: u32| MemorySize::from_bytes(1024u64.pow(n));
        MemSizes {
            mem1: pow(0),
            mem2: pow(1),
            mem3: pow(2),
            mem4: pow(3),
            mem5: pow(4),
            mem6: pow(5),
            mem7: pow(6),
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct LenientBools {
        #[serde(with = "crate::lenient_bool")]
        pub bool1: bool,
        #[serde(with = "crate::lenient_bool")]
        pub bool2: bool,
        #[serde(with = "crate::lenient_bool")]
        pub bool3: bool,
        #[serde(with = "crate::lenient_bool")]
        pub bool4: bool,
        #[serde(with = "crate::lenient_bool")]
        pub bool5: bool,
        #[serde(with = "crate::lenient_bool")]
        pub bool6: bool,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct OptionalValue {
        #[serde(rename = "optValue")]
        pub opt_value: Option<String>,
    }

    fn default_value() -> String {
        "default".into()
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct DefaultedValue {
        #[serde(rename = "optValue", default = "default_value")]
        pub opt_value: String,
    }

    // -- Enums with payloads -----------------------------------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum Backend {
        Memory,
        Disk { path: String, size: MemorySize },
        Remote(String),
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Storage {
        pub backend: Backend,
    }
}
