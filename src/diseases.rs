use serde::Serialize;

/// Static reference entry for one disease class.
#[derive(Debug, Clone, Serialize)]
pub struct DiseaseInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub severity: &'static str,
    pub description: &'static str,
    pub recommendations: &'static [&'static str],
}

pub const DISEASES: [DiseaseInfo; 5] = [
    DiseaseInfo {
        id: "early_blight",
        name: "Early Blight (Alternaria solani)",
        severity: "moderate",
        description: "Caused by the fungus Alternaria solani, which attacks \
            leaves, stems and fruit. Usually starts as brown spots with \
            concentric rings on the older leaves.",
        recommendations: &[
            "Apply a copper- or sulfur-based fungicide as directed on the label",
            "Remove and burn infected leaves to stop the spread",
            "Keep good air circulation between plants",
            "Rotate crops every growing season",
            "Avoid watering in the evening so foliage does not stay wet overnight",
        ],
    },
    DiseaseInfo {
        id: "late_blight",
        name: "Late Blight (Phytophthora infestans)",
        severity: "high",
        description: "Caused by the pathogen Phytophthora infestans, attacking \
            leaves, stems and fruit. It spreads rapidly in humid conditions \
            and can destroy a whole plant in a short time.",
        recommendations: &[
            "Apply a preventive fungicide with mancozeb or chlorothalonil on a regular schedule",
            "Remove and burn infected plants immediately",
            "Monitor plants closely, especially during the rainy season",
            "Avoid watering in the late afternoon or at night",
            "Plant late-blight-resistant tomato varieties next season",
        ],
    },
    DiseaseInfo {
        id: "leaf_mold",
        name: "Leaf Mold (Passalora fulva)",
        severity: "moderate",
        description: "A fungal disease caused by Passalora fulva. It shows as \
            yellow spots on the upper leaf surface with an olive-green to \
            brown mold layer underneath.",
        recommendations: &[
            "Reduce humidity around the plants by improving air circulation",
            "Apply a copper-based or chlorothalonil fungicide as directed",
            "Carefully remove infected leaves",
            "Avoid wetting the foliage when watering",
            "Keep enough spacing between plants for ventilation",
        ],
    },
    DiseaseInfo {
        id: "septoria_leaf_spot",
        name: "Septoria Leaf Spot (Septoria lycopersici)",
        severity: "moderate",
        description: "Caused by the fungus Septoria lycopersici. Small round \
            brown spots with dark margins and light centers, typically \
            appearing on the lower leaves first.",
        recommendations: &[
            "Apply a copper, mancozeb or chlorothalonil fungicide as directed",
            "Remove infected leaves and do not compost them",
            "Clear plant debris from the garden at the end of the season",
            "Rotate crops for at least two years",
            "Water at the base so the leaves stay dry",
        ],
    },
    DiseaseInfo {
        id: "healthy",
        name: "Healthy Leaf",
        severity: "low",
        description: "The leaf shows no sign of disease or pests. Color is a \
            bright green and the structure is normal.",
        recommendations: &[
            "Keep up good practice such as regular watering",
            "Feed a balanced fertilizer matched to the growth stage",
            "Monitor the plants regularly to catch problems early",
            "Maintain garden sanitation to prevent disease",
            "Prune regularly for good air circulation",
        ],
    },
];

pub fn lookup(id: &str) -> Option<&'static DiseaseInfo> {
    DISEASES.iter().find(|d| d.id == id)
}
