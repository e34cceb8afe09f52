//! Built-in user-visible strings the booking core produces itself.
//!
//! Everything else the user reads comes from the site's own string catalogs.
//! These cover the cases where the endpoint gave us nothing to show.

use crate::models::Locale;

pub struct Messages;

impl Messages {
    /// The request never completed (offline, DNS, timeout, refused).
    pub fn network_error(locale: Locale) -> &'static str {
        match locale {
            Locale::En => "We couldn't reach the booking service. Please check your connection and try again.",
            Locale::Ar => "تعذر الاتصال بخدمة الحجز. يرجى التحقق من اتصالك والمحاولة مرة أخرى.",
        }
    }

    /// The endpoint rejected the booking without a usable message.
    pub fn generic_error(locale: Locale) -> &'static str {
        match locale {
            Locale::En => "Something went wrong while booking your visit. Please try again.",
            Locale::Ar => "حدث خطأ أثناء حجز زيارتك. يرجى المحاولة مرة أخرى.",
        }
    }

    /// Shown on the success screen when the endpoint sent no message.
    pub fn booking_confirmed(locale: Locale) -> &'static str {
        match locale {
            Locale::En => "Your visit is booked. We will contact you to confirm the details.",
            Locale::Ar => "تم حجز زيارتك. سنتواصل معك لتأكيد التفاصيل.",
        }
    }
}
