use std::collections::HashMap;

/// Origin value → province names used by the choropleth.
#[derive(Debug, Clone, Default)]
pub struct ProvinceMap {
    city_to_province: HashMap<String, String>,
    multi_province: HashMap<String, Vec<String>>,
}

const SPAIN_CITIES: &[(&str, &str)] = &[
    ("Valencia", "València/Valencia"),
    ("Barcelona", "Barcelona"),
    ("Pamplona", "Navarra"),
    ("Valladolid", "Valladolid"),
    ("Bilbao", "Bizkaia/Vizcaya"),
    ("Murcia", "Murcia"),
    ("Logroño", "La Rioja"),
    ("Sevilla", "Sevilla"),
    ("Madrid", "Madrid"),
    ("Granada", "Granada"),
    ("Melilla", "Melilla"),
    ("Salamanca", "Salamanca"),
    ("San Sebastián", "Gipuzkoa/Guipúzcoa"),
    ("Huelva", "Huelva"),
    ("Zaragoza", "Zaragoza"),
    ("Málaga", "Málaga"),
    ("Albacete", "Albacete"),
    ("Santander", "Cantabria"),
    ("Almeria", "Almería"),
    ("Oviedo", "Asturias"),
    ("Alicante", "Alacant/Alicante"),
    ("Mondragon", "Gipuzkoa/Guipúzcoa"),
    ("Ceuta", "Ceuta"),
];

pub const GALICIA: &str = "Galicia";
pub const GALICIA_PROVINCES: [&str; 4] = ["A Coruña", "Lugo", "Ourense", "Pontevedra"];

impl ProvinceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Province table for Spanish origins, with Galicia as a whole region.
    pub fn spain() -> Self {
        let mut map = Self::new();
        for (city, province) in SPAIN_CITIES {
            map = map.with_city(*city, *province);
        }
        map.with_region(GALICIA, GALICIA_PROVINCES)
    }

    pub fn with_city(mut self, city: impl Into<String>, province: impl Into<String>) -> Self {
        self.city_to_province.insert(city.into(), province.into());
        self
    }

    pub fn with_region<I, S>(mut self, region: impl Into<String>, provinces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.multi_province
            .insert(region.into(), provinces.into_iter().map(Into::into).collect());
        self
    }

    /// Provinces an origin value lands in. Regions fan out to every listed
    /// province; unknown cities are their own province.
    pub fn resolve<'a>(&'a self, origin: &'a str) -> Vec<&'a str> {
        if let Some(provinces) = self.multi_province.get(origin) {
            return provinces.iter().map(String::as_str).collect();
        }
        match self.city_to_province.get(origin) {
            Some(p) => vec![p.as_str()],
            None => vec![origin],
        }
    }
}
