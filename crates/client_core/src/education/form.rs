use shared::domain::{EducationResource, ResourceFields, ResourceKind};

/// Editor form contents. Optional links are plain strings here; an empty
/// string means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFormValues {
    pub title: String,
    pub description: String,
    pub kind: ResourceKind,
    pub category: String,
    pub author: String,
    pub external_url: String,
    pub image_url: String,
    pub is_published: bool,
}

impl ResourceFormValues {
    pub fn from_resource(resource: &EducationResource) -> Self {
        Self {
            title: resource.title.clone(),
            description: resource.description.clone(),
            kind: resource.kind.clone(),
            category: resource.category.clone(),
            author: resource.author.clone(),
            external_url: resource.external_url.clone().unwrap_or_default(),
            image_url: resource.image_url.clone().unwrap_or_default(),
            is_published: resource.is_published,
        }
    }

    pub fn into_fields(self) -> ResourceFields {
        ResourceFields {
            title: self.title,
            description: self.description,
            kind: self.kind,
            category: self.category,
            author: self.author,
            external_url: non_blank(self.external_url),
            image_url: non_blank(self.image_url),
            is_published: self.is_published,
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
