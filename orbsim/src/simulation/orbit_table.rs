//! Tabulated periodic three-body orbit families
//!
//! Each family (`"IA"`, `"IB"`, `"IIC"`) is an ordered list of
//! `(v1, v2, period)` triples from numerical continuation of periodic
//! equal-mass-pair solutions. The index of an entry is its position in the
//! list, so entry order is part of the data.
//!
//! The reference table is embedded and built once per process; code that
//! needs a different table builds its own [`OrbitTable`] and passes it in.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::SimError;

/// Initial velocity pair and period of one periodic orbit
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 3]")]
pub struct OrbitEntry {
    pub v1: f64,
    pub v2: f64,
    pub period: f64,
}

impl OrbitEntry {
    pub const fn new(v1: f64, v2: f64, period: f64) -> Self {
        Self { v1, v2, period }
    }
}

impl From<[f64; 3]> for OrbitEntry {
    fn from([v1, v2, period]: [f64; 3]) -> Self {
        Self::new(v1, v2, period)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrbitFamily {
    pub key: String,
    pub entries: Vec<OrbitEntry>,
}

/// Read-only `family key -> [OrbitEntry]` mapping
///
/// Deserializes from a list of families, e.g.
///
/// ```yaml
/// - key: IA
///   entries:
///     - [0.2869236336, 0.0791847624, 4.1761292190]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct OrbitTable {
    families: Vec<OrbitFamily>,
}

impl OrbitTable {
    pub fn from_families(families: Vec<OrbitFamily>) -> Self {
        Self { families }
    }

    /// The embedded IA / IB / IIC table, shared by the whole process
    pub fn reference() -> &'static OrbitTable {
        static TABLE: OnceLock<OrbitTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            let family = |key: &str, entries: &[OrbitEntry]| OrbitFamily {
                key: key.to_string(),
                entries: entries.to_vec(),
            };
            OrbitTable::from_families(vec![
                family("IA", &IA),
                family("IB", &IB),
                family("IIC", &IIC),
            ])
        })
    }

    pub fn families(&self) -> impl Iterator<Item = &OrbitFamily> {
        self.families.iter()
    }

    pub fn family(&self, key: &str) -> Result<&OrbitFamily, SimError> {
        self.families
            .iter()
            .find(|f| f.key == key)
            .ok_or_else(|| SimError::UnknownFamily(key.to_string()))
    }

    /// Number of entries across all families
    pub fn len(&self) -> usize {
        self.families.iter().map(|f| f.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, key: &str, index: usize) -> Result<OrbitEntry, SimError> {
        let family = self.family(key)?;
        family
            .entries
            .get(index)
            .copied()
            .ok_or_else(|| SimError::IndexOutOfRange {
                family: key.to_string(),
                index,
                len: family.entries.len(),
            })
    }
}

const IA: [OrbitEntry; 45] = [
    OrbitEntry::new(0.2869236336, 0.0791847624, 4.1761292190),
    OrbitEntry::new(0.3420307307, 0.1809369236, 13.9153339459),
    OrbitEntry::new(0.3697718457, 0.1910065395, 25.9441952945),
    OrbitEntry::new(0.2009656237, 0.2431076328, 19.0134164290),
    OrbitEntry::new(0.2613236072, 0.2356235235, 28.4358575383),
    OrbitEntry::new(0.1908428490, 0.1150772110, 15.9682350284),
    OrbitEntry::new(0.1579313682, 0.0949852732, 14.5766076405),
    OrbitEntry::new(0.0979965852, 0.0369408875, 15.6059191780),
    OrbitEntry::new(0.3589116510, 0.0578397225, 35.2777168591),
    OrbitEntry::new(0.2066204352, 0.1123859298, 22.8770013381),
    OrbitEntry::new(0.3095805649, 0.1012188182, 37.8353981553),
    OrbitEntry::new(0.2935606362, 0.2168613674, 54.5846159117),
    OrbitEntry::new(0.2614113685, 0.1097599351, 39.2849176561),
    OrbitEntry::new(0.3049866810, 0.0979042378, 46.1065937257),
    OrbitEntry::new(0.1644199050, 0.0637816144, 29.0215071279),
    OrbitEntry::new(0.2698142826, 0.0360688014, 37.8687787781),
    OrbitEntry::new(0.1451647294, 0.0318334148, 30.5079373557),
    OrbitEntry::new(0.3467747647, 0.0474429378, 59.7722919460),
    OrbitEntry::new(0.3025694869, 0.0951546278, 54.5401904272),
    OrbitEntry::new(0.2726720005, 0.0478754379, 46.2148464304),
    OrbitEntry::new(0.2997637007, 0.0934329270, 62.7105115603),
    OrbitEntry::new(0.2747511246, 0.0544869553, 54.5744279508),
    OrbitEntry::new(0.2867479329, 0.0521752523, 57.0633556930),
    OrbitEntry::new(0.2172290935, 0.0383448898, 45.1666009592),
    OrbitEntry::new(0.3108794721, 0.1023369865, 71.4799545005),
    OrbitEntry::new(0.2979925625, 0.0918951185, 70.9842467059),
    OrbitEntry::new(0.2366779591, 0.0914177522, 56.6833946453),
    OrbitEntry::new(0.1628551705, 0.0589464762, 46.2097799724),
    OrbitEntry::new(0.2763361520, 0.0588302447, 62.9447137981),
    OrbitEntry::new(0.1936757357, 0.0730232621, 49.7181917085),
    OrbitEntry::new(0.3017504100, 0.1030778699, 77.7653686390),
    OrbitEntry::new(0.1671144104, 0.0438815944, 49.1675240282),
    OrbitEntry::new(0.3274705985, 0.0612651208, 84.0143824473),
    OrbitEntry::new(0.2668455153, 0.0138391891, 63.2419174415),
    OrbitEntry::new(0.3220251063, 0.0754954232, 87.6821712800),
    OrbitEntry::new(0.2965579937, 0.0906370328, 79.2439520137),
    OrbitEntry::new(0.2775882955, 0.0619333069, 71.3240509215),
    OrbitEntry::new(0.3558062278, 0.0405108521, 108.4971611336),
    OrbitEntry::new(0.3060017590, 0.0986219478, 88.0890690057),
    OrbitEntry::new(0.2689229383, 0.0312527426, 71.5697332821),
    OrbitEntry::new(0.1317126561, 0.0254909293, 51.5736578935),
    OrbitEntry::new(0.1428972736, 0.0445901978, 55.4783856796),
    OrbitEntry::new(0.3132151994, 0.1046181562, 96.6632360131),
    OrbitEntry::new(0.2954964679, 0.0895434067, 87.5354654697),
    OrbitEntry::new(0.2749526022, 0.0648656500, 78.6571356819),
];

const IB: [OrbitEntry; 50] = [
    OrbitEntry::new(0.2374365149, 0.2536896353, 8.5581422789),
    OrbitEntry::new(0.2707702758, 0.2974619413, 19.9858290667),
    OrbitEntry::new(0.1804341862, 0.0774390466, 10.5764781985),
    OrbitEntry::new(0.0548520001, 0.3291535443, 20.9927052014),
    OrbitEntry::new(0.2817159946, 0.3093138094, 31.1291374576),
    OrbitEntry::new(0.2679384847, 0.0246961144, 16.8511048757),
    OrbitEntry::new(0.2674226718, 0.2139289499, 23.9372167355),
    OrbitEntry::new(0.2878430093, 0.3151477978, 42.2778567687),
    OrbitEntry::new(0.3030963188, 0.0966599779, 25.1036320618),
    OrbitEntry::new(0.1099852485, 0.0308448543, 14.5241562996),
    OrbitEntry::new(0.2291294485, 0.2119828182, 24.7437423714),
    OrbitEntry::new(0.3692649167, 0.0417694147, 34.2771859316),
    OrbitEntry::new(0.2737871583, 0.0515706441, 25.1965811355),
    OrbitEntry::new(0.2988140236, 0.0926281921, 33.4227154398),
    OrbitEntry::new(0.2788426894, 0.0601828236, 33.7944313342),
    OrbitEntry::new(0.2790832581, 0.2276230751, 50.6192127242),
    OrbitEntry::new(0.2163072511, 0.0457824324, 27.4550707427),
    OrbitEntry::new(0.2631918196, 0.0971022505, 36.9742814503),
    OrbitEntry::new(0.1940565085, 0.0716923953, 29.5220753291),
    OrbitEntry::new(0.2790460219, 0.0652447476, 41.9537927832),
    OrbitEntry::new(0.1166234512, 0.0062473070, 27.8908904718),
    OrbitEntry::new(0.2941922385, 0.0882015308, 49.9756827423),
    OrbitEntry::new(0.1482620649, 0.0469161409, 32.2082149709),
    OrbitEntry::new(0.3383350929, 0.0633820096, 60.3349978637),
    OrbitEntry::new(0.3086986007, 0.1005760508, 58.8260422524),
    OrbitEntry::new(0.2804820502, 0.0682367913, 50.3545241044),
    OrbitEntry::new(0.2928957198, 0.0867806393, 58.2512450352),
    OrbitEntry::new(0.3121801357, 0.0954940881, 68.9135784414),
    OrbitEntry::new(0.2815530004, 0.0703169410, 58.7667019161),
    OrbitEntry::new(0.2702462061, 0.0720377706, 56.4003264775),
    OrbitEntry::new(0.2131987197, 0.0555522173, 46.7195262030),
    OrbitEntry::new(0.1832565230, 0.0627595131, 46.7521066510),
    OrbitEntry::new(0.2919082649, 0.0856563914, 66.5195343482),
    OrbitEntry::new(0.2703631586, 0.0386904791, 58.8880393273),
    OrbitEntry::new(0.1859380756, 0.0731374234, 50.3601763743),
    OrbitEntry::new(0.2489094150, 0.0992895950, 61.2653969718),
    OrbitEntry::new(0.2823888686, 0.0718580778, 67.1889348357),
    OrbitEntry::new(0.1615485916, 0.0277748182, 46.9823741559),
    OrbitEntry::new(0.2911309221, 0.0847384936, 74.7822861358),
    OrbitEntry::new(0.1771098445, 0.0784887228, 52.5734020100),
    OrbitEntry::new(0.1838565013, 0.0752899792, 53.1629113586),
    OrbitEntry::new(0.2143486812, 0.0918266864, 58.0738450139),
    OrbitEntry::new(0.3247862862, 0.0695897171, 85.9588123017),
    OrbitEntry::new(0.1610459823, 0.0516375322, 50.2179896145),
    OrbitEntry::new(0.2722601340, 0.0464077813, 67.2341769532),
    OrbitEntry::new(0.3192498609, 0.0879575434, 90.1594809343),
    OrbitEntry::new(0.2830620767, 0.0730518241, 75.6195474605),
    OrbitEntry::new(0.2905035826, 0.0839717300, 83.0409561905),
    OrbitEntry::new(0.3002585565, 0.1059795568, 88.9553085721),
    OrbitEntry::new(0.2174816082, 0.0342966208, 62.8453538957),
];

const IIC: [OrbitEntry; 30] = [
    OrbitEntry::new(0.2057599772, 0.2910772545, 16.4482452694),
    OrbitEntry::new(0.0621756721, 0.0261903906, 6.2854133740),
    OrbitEntry::new(0.0657658390, 0.1124034346, 8.0617096205),
    OrbitEntry::new(0.0169747300, 0.0752136850, 8.8877784855),
    OrbitEntry::new(0.2251711660, 0.3443496457, 32.8998590701),
    OrbitEntry::new(0.1194732446, 0.0207612630, 10.6764792286),
    OrbitEntry::new(0.0551050358, 0.3697557117, 28.5843693576),
    OrbitEntry::new(0.0108740090, 0.3192205525, 25.7212160836),
    OrbitEntry::new(0.3448435595, 0.0697188543, 24.6216211722),
    OrbitEntry::new(0.0117243540, 0.3525284661, 28.5310959155),
    OrbitEntry::new(0.1780039242, 0.2004919509, 16.5294086907),
    OrbitEntry::new(0.1282291061, 0.3649372977, 40.6015240363),
    OrbitEntry::new(0.3234173131, 0.2471156877, 44.4546188773),
    OrbitEntry::new(0.2104677107, 0.1057158539, 18.2820987595),
    OrbitEntry::new(0.1983865989, 0.1226004003, 19.7881493182),
    OrbitEntry::new(0.2287935035, 0.0923297799, 22.5126057181),
    OrbitEntry::new(0.0913811473, 0.0093493963, 16.8086808175),
    OrbitEntry::new(0.2383747181, 0.2447155547, 35.0733137252),
    OrbitEntry::new(0.0992256924, 0.0269686482, 18.2257172127),
    OrbitEntry::new(0.3345991412, 0.0565118924, 35.7753676955),
    OrbitEntry::new(0.1490452956, 0.0531097638, 21.0786048660),
    OrbitEntry::new(0.2263132666, 0.0992959988, 25.8750904330),
    OrbitEntry::new(0.1822531374, 0.1005779979, 22.9574138909),
    OrbitEntry::new(0.3130939094, 0.0872917851, 35.4487192804),
    OrbitEntry::new(0.2379407604, 0.2522685220, 44.6369551897),
    OrbitEntry::new(0.1230951336, 0.0496740170, 21.5462119008),
    OrbitEntry::new(0.1326230917, 0.0945397322, 24.0011090101),
    OrbitEntry::new(0.1440416968, 0.1072211552, 24.7755961375),
    OrbitEntry::new(0.1444470268, 0.0693298831, 25.2083739245),
    OrbitEntry::new(0.3196418099, 0.1040424691, 47.3539072837),
];
